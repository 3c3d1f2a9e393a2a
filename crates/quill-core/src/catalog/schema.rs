//! Field schemas: the ordered, audit-free fields of one entity.

use super::FieldDef;
use crate::error::SchemaError;
use serde::Serialize;
use std::collections::HashSet;

/// The ordered set of fields an entity declares, excluding audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    /// Entity name.
    pub entity: String,
    fields: Vec<FieldDef>,
}

impl FieldSchema {
    /// Create a schema, rejecting repeated field names.
    ///
    /// Declaration order is preserved and becomes the column order.
    pub fn new(
        entity: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<Self, SchemaError> {
        let entity = entity.into();
        let fields: Vec<FieldDef> = fields.into_iter().collect();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self { entity, fields })
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Fields flagged as primary.
    pub fn primary_key_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.primary_key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
