//! Field definitions for entities.

use super::types::FieldType;
use serde::Serialize;

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Field (column) name.
    pub name: String,
    /// Semantic type tag.
    pub field_type: FieldType,
    /// Whether the field accepts null.
    pub nullable: bool,
    /// Whether the field is the entity's primary key.
    pub primary_key: bool,
    /// Declared foreign-key target, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<FieldRef>,
}

/// A reference to a field on another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    /// Referenced entity name.
    pub entity: String,
    /// Referenced field name.
    pub field: String,
}

impl FieldDef {
    /// Create a nullable field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            primary_key: false,
            references: None,
        }
    }

    /// Create a nullable text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Create a nullable integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Create a nullable blob field.
    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Blob)
    }

    /// Create a nullable enum-tagged text field.
    pub fn enumeration(
        name: impl Into<String>,
        enum_name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(name, FieldType::enum_type(enum_name, variants))
    }

    /// Mark as the primary key. Primary keys are never null.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as not null.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Declare a foreign-key reference to `entity.field`.
    pub fn references(mut self, entity: impl Into<String>, field: impl Into<String>) -> Self {
        self.references = Some(FieldRef {
            entity: entity.into(),
            field: field.into(),
        });
        self
    }

    /// Check if this field references the given entity.
    pub fn references_entity(&self, entity: &str) -> bool {
        self.references
            .as_ref()
            .map(|r| r.entity == entity)
            .unwrap_or(false)
    }
}
