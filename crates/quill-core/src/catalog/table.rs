//! Table definitions: a composed field schema bound to a physical name.

use super::audit::{compose_schema, TableFields};
use super::{FieldDef, FieldSchema};
use crate::error::SchemaError;
use serde::Serialize;

/// A table's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    /// A single column flagged primary in the field schema.
    Single(String),
    /// Several columns unique together (join tables).
    Composite(Vec<String>),
}

impl PrimaryKey {
    /// Key columns in key order.
    pub fn fields(&self) -> &[String] {
        match self {
            PrimaryKey::Single(field) => std::slice::from_ref(field),
            PrimaryKey::Composite(fields) => fields,
        }
    }

    /// Check if the field is (part of) the key.
    pub fn contains(&self, field: &str) -> bool {
        self.fields().iter().any(|f| f == field)
    }

    /// Check if this is a composite key.
    pub fn is_composite(&self) -> bool {
        matches!(self, PrimaryKey::Composite(_))
    }
}

/// A secondary index declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed fields, leading field first.
    pub fields: Vec<String>,
}

impl IndexDef {
    /// Create an index over the given fields.
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an index over a single field.
    pub fn on(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, [field.into()])
    }

    /// The first indexed field.
    pub fn leading_field(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }
}

/// A table definition: entity fields plus audit fields, a key, and indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDef {
    /// Physical table name (also the entity name).
    pub name: String,
    /// Composed columns.
    pub fields: TableFields,
    /// Primary key.
    pub primary_key: PrimaryKey,
    /// Secondary indexes.
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    /// Define a table from a field schema and its index declarations.
    pub fn define(
        schema: &FieldSchema,
        indexes: impl IntoIterator<Item = IndexDef>,
    ) -> Result<Self, SchemaError> {
        let mut builder = Self::builder(schema);
        builder.indexes.extend(indexes);
        builder.build()
    }

    /// Start building a table from a field schema.
    pub fn builder(schema: &FieldSchema) -> TableBuilder<'_> {
        TableBuilder {
            schema,
            indexes: Vec::new(),
            composite_key: None,
        }
    }

    /// Get a column by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Column definitions of the primary key, in key order.
    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.primary_key
            .fields()
            .iter()
            .filter_map(move |name| self.fields.get(name))
    }

    /// Find an index whose leading field is `field`.
    pub fn index_on(&self, field: &str) -> Option<&IndexDef> {
        self.indexes
            .iter()
            .find(|index| index.leading_field() == Some(field))
    }
}

/// Builder for [`TableDef`].
pub struct TableBuilder<'a> {
    schema: &'a FieldSchema,
    indexes: Vec<IndexDef>,
    composite_key: Option<Vec<String>>,
}

impl TableBuilder<'_> {
    /// Declare a secondary index.
    pub fn index(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.indexes.push(IndexDef::new(name, fields));
        self
    }

    /// Use a composite primary key instead of a single primary field.
    pub fn composite_key(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.composite_key = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Compose the audit fields in and validate keys and indexes.
    pub fn build(self) -> Result<TableDef, SchemaError> {
        let table = self.schema.entity.clone();
        let mut fields = compose_schema(self.schema)?;

        let primary_key = match self.composite_key {
            Some(key) => {
                for name in &key {
                    match fields.get_mut(name) {
                        Some(field) => field.nullable = false,
                        None => {
                            return Err(SchemaError::UnknownKeyField {
                                table,
                                field: name.clone(),
                            })
                        }
                    }
                }
                PrimaryKey::Composite(key)
            }
            None => {
                let mut primaries = self.schema.primary_key_fields();
                match (primaries.next(), primaries.next()) {
                    (Some(field), None) => PrimaryKey::Single(field.name.clone()),
                    (Some(_), Some(_)) => PrimaryKey::Composite(
                        self.schema
                            .primary_key_fields()
                            .map(|f| f.name.clone())
                            .collect(),
                    ),
                    (None, _) => return Err(SchemaError::MissingPrimaryKey(table)),
                }
            }
        };

        for index in &self.indexes {
            if let Some(missing) = index.fields.iter().find(|f| !fields.contains(f)) {
                return Err(SchemaError::UnknownIndexField {
                    table,
                    index: index.name.clone(),
                    field: missing.clone(),
                });
            }
        }

        Ok(TableDef {
            name: table,
            fields,
            primary_key,
            indexes: self.indexes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_schema() -> FieldSchema {
        FieldSchema::new(
            "comments",
            [
                FieldDef::text("id").primary_key(),
                FieldDef::text("body"),
                FieldDef::text("userId"),
                FieldDef::text("postId"),
            ],
        )
        .unwrap()
    }

    fn link_schema() -> FieldSchema {
        FieldSchema::new(
            "categoriesToPosts",
            [
                FieldDef::text("id").not_null(),
                FieldDef::text("postId").not_null(),
                FieldDef::text("categoryId").not_null(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_define_table() {
        let table = TableDef::define(
            &comment_schema(),
            [
                IndexDef::on("commentsUserIdIndex", "userId"),
                IndexDef::on("commentsPostIdIndex", "postId"),
            ],
        )
        .unwrap();

        assert_eq!(table.name, "comments");
        assert_eq!(table.primary_key, PrimaryKey::Single("id".into()));
        assert_eq!(table.fields.len(), 6);
        assert!(table.get_field("createdOn").is_some());
        assert_eq!(table.index_on("postId").unwrap().name, "commentsPostIdIndex");
        assert!(table.index_on("body").is_none());
    }

    #[test]
    fn test_unknown_index_field() {
        let err = TableDef::define(
            &comment_schema(),
            [IndexDef::on("badIndex", "nonExistentField")],
        )
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::UnknownIndexField {
                table: "comments".into(),
                index: "badIndex".into(),
                field: "nonExistentField".into(),
            }
        );
    }

    #[test]
    fn test_index_on_audit_field_allowed() {
        let table = TableDef::builder(&comment_schema())
            .index("commentsCreatedOnIndex", ["createdOn"])
            .build()
            .unwrap();

        assert_eq!(table.indexes.len(), 1);
    }

    #[test]
    fn test_composite_key() {
        let table = TableDef::builder(&link_schema())
            .composite_key(["postId", "categoryId"])
            .build()
            .unwrap();

        assert!(table.primary_key.is_composite());
        assert_eq!(table.primary_key.fields(), ["postId", "categoryId"]);
        assert!(table.primary_key.contains("categoryId"));
        assert!(!table.primary_key.contains("id"));
        assert_eq!(table.key_fields().count(), 2);
    }

    #[test]
    fn test_composite_key_unknown_field() {
        let err = TableDef::builder(&link_schema())
            .composite_key(["postId", "tagId"])
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::UnknownKeyField { field, .. } if field == "tagId"));
    }

    #[test]
    fn test_missing_primary_key() {
        let err = TableDef::define(&link_schema(), Vec::new()).unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey("categoriesToPosts".into()));
    }
}
