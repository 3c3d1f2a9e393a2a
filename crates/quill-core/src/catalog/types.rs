//! Semantic field types.

use serde::Serialize;
use serde_json::Value;

/// Storage-engine-neutral type tag for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer (also used for timestamps).
    Integer,
    /// Opaque binary data, carried as a base64 or plain string.
    Blob,
    /// Text restricted to a fixed set of variants.
    Enum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant values.
        variants: Vec<String>,
    },
}

impl FieldType {
    /// Create an enum field type.
    pub fn enum_type(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        FieldType::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this type is stored as text.
    pub fn is_text_like(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Blob | FieldType::Enum { .. })
    }

    /// Check whether two types can be joined on (foreign key against primary key).
    pub fn is_join_compatible(&self, other: &FieldType) -> bool {
        match (self, other) {
            (FieldType::Integer, FieldType::Integer) => true,
            (a, b) => a.is_text_like() && b.is_text_like(),
        }
    }

    /// Check whether a non-null JSON value carries this type tag.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text | FieldType::Blob => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Enum { variants, .. } => value
                .as_str()
                .map(|s| variants.iter().any(|v| v == s))
                .unwrap_or(false),
        }
    }

    /// Short display name of the tag.
    pub fn tag(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Blob => "blob",
            FieldType::Enum { name, .. } => name,
        }
    }
}
