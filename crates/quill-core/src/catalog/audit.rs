//! Audit mixin appended to every persisted entity.

use super::{FieldDef, FieldSchema};
use crate::error::SchemaError;
use serde::Serialize;

/// Creation timestamp field.
pub const CREATED_ON: &str = "createdOn";

/// Last-modification timestamp field.
pub const UPDATED_ON: &str = "updatedOn";

/// Reserved audit field names, in column order.
pub const AUDIT_FIELD_NAMES: [&str; 2] = [CREATED_ON, UPDATED_ON];

/// The audit fields, both nullable integer timestamps.
pub fn audit_fields() -> [FieldDef; 2] {
    [FieldDef::integer(CREATED_ON), FieldDef::integer(UPDATED_ON)]
}

/// Check whether a field name is reserved by the audit mixin.
pub fn is_audit_field(name: &str) -> bool {
    AUDIT_FIELD_NAMES.contains(&name)
}

/// An entity's fields followed by the audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableFields {
    #[serde(skip)]
    entity_len: usize,
    fields: Vec<FieldDef>,
}

impl TableFields {
    /// All fields, entity fields first.
    pub fn all(&self) -> &[FieldDef] {
        &self.fields
    }

    /// The entity-specific prefix.
    pub fn entity_fields(&self) -> &[FieldDef] {
        &self.fields[..self.entity_len]
    }

    /// The audit suffix.
    pub fn audit_fields(&self) -> &[FieldDef] {
        &self.fields[self.entity_len..]
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check whether a field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no columns. Never true for a composed table.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

/// Merge an entity's fields with the audit fields.
///
/// Entity fields keep their declaration order and the audit fields follow.
pub fn compose_schema(schema: &FieldSchema) -> Result<TableFields, SchemaError> {
    if let Some(field) = schema.field_names().find(|name| is_audit_field(name)) {
        return Err(SchemaError::SchemaConflict {
            entity: schema.entity.clone(),
            field: field.to_string(),
        });
    }

    let mut fields = Vec::with_capacity(schema.len() + AUDIT_FIELD_NAMES.len());
    fields.extend_from_slice(schema.fields());
    fields.extend(audit_fields());

    Ok(TableFields {
        entity_len: schema.len(),
        fields,
    })
}
