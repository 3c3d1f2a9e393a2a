//! Core error types.

use thiserror::Error;

/// Declaration-time schema errors.
///
/// Every variant is fatal: a catalog that fails to build must abort startup
/// before any route is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An entity field collides with a reserved audit field.
    #[error("entity '{entity}' declares reserved audit field '{field}'")]
    SchemaConflict { entity: String, field: String },

    /// A secondary index names a field the table does not have.
    #[error("index '{index}' on table '{table}' references unknown field '{field}'")]
    UnknownIndexField {
        table: String,
        index: String,
        field: String,
    },

    /// A relation's foreign key does not resolve to a primary key on its target.
    #[error("relation from '{entity}.{field}' to '{target}' is dangling: {reason}")]
    DanglingReference {
        entity: String,
        field: String,
        target: String,
        reason: String,
    },

    /// A field name appears twice within one entity.
    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    /// Two entities share a name.
    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    /// Two entities share a route path.
    #[error("route '{route}' is bound to both '{existing}' and '{entity}'")]
    DuplicateRoute {
        route: String,
        existing: String,
        entity: String,
    },

    /// A composite primary key names a field the table does not have.
    #[error("primary key of table '{table}' references unknown field '{field}'")]
    UnknownKeyField { table: String, field: String },

    /// A table has neither a primary field nor a composite key.
    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// A relation name is reused on the same source entity.
    #[error("entity '{entity}' already has a relation named '{name}'")]
    DuplicateRelation { entity: String, name: String },
}

/// Runtime errors raised by the storage driver and relation resolver.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Row encoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row with the same primary key already exists.
    #[error("primary key violation on '{table}': key ({key}) already exists")]
    PrimaryKeyViolation { table: String, key: String },

    /// A row does not match the table's field definitions.
    #[error("invalid row for '{table}': {reason}")]
    InvalidRow { table: String, reason: String },

    /// The entity name is not known to the catalog.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// The relation name is not declared on the entity.
    #[error("entity '{entity}' has no relation named '{relation}'")]
    UnknownRelation { entity: String, relation: String },

    /// Schema declaration error.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl Error {
    pub(crate) fn invalid_row(table: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRow {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}
