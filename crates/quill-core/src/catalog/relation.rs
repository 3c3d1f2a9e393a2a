//! Relation definitions between entities.

use serde::Serialize;

/// Kind of a relation edge, seen from its source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The source owns zero or more target rows (foreign key on the target).
    OneToMany,
    /// The source references exactly one target row (foreign key on the source).
    ManyToOne,
    /// Source and target are linked through a join table.
    ManyToMany,
}

/// The join table a many-to-many edge is routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPath {
    /// Join table name.
    pub table: String,
    /// Join column referencing the source entity.
    pub source_field: String,
    /// Join column referencing the target entity.
    pub target_field: String,
}

/// A named, directed relation edge.
///
/// Entities are referenced by name and resolved lazily by whoever walks the
/// graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDef {
    /// Relation name (unique per source entity).
    pub name: String,
    /// Edge kind.
    pub kind: RelationKind,
    /// Source entity name.
    pub source: String,
    /// Target entity name.
    pub target: String,
    /// Fields on the source matched during traversal.
    pub local_fields: Vec<String>,
    /// Fields on the target (or join table) matched against `local_fields`.
    pub referenced_fields: Vec<String>,
    /// Join table for many-to-many edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through: Option<JoinPath>,
}

impl RelationDef {
    /// Create a many-to-one edge: `source.local_field -> target.referenced_field`.
    pub fn many_to_one(
        name: impl Into<String>,
        source: impl Into<String>,
        local_field: impl Into<String>,
        target: impl Into<String>,
        referenced_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ManyToOne,
            source: source.into(),
            target: target.into(),
            local_fields: vec![local_field.into()],
            referenced_fields: vec![referenced_field.into()],
            through: None,
        }
    }

    /// Create a one-to-many edge: target rows whose `foreign_key` equals `source.local_field`.
    pub fn one_to_many(
        name: impl Into<String>,
        source: impl Into<String>,
        local_field: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::OneToMany,
            source: source.into(),
            target: target.into(),
            local_fields: vec![local_field.into()],
            referenced_fields: vec![foreign_key.into()],
            through: None,
        }
    }

    /// Create a many-to-many edge routed through a join table.
    pub fn many_to_many(
        name: impl Into<String>,
        source: impl Into<String>,
        local_field: impl Into<String>,
        target: impl Into<String>,
        referenced_field: impl Into<String>,
        through: JoinPath,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ManyToMany,
            source: source.into(),
            target: target.into(),
            local_fields: vec![local_field.into()],
            referenced_fields: vec![referenced_field.into()],
            through: Some(through),
        }
    }

    /// Check if this is a many-to-many relation.
    pub fn is_many_to_many(&self) -> bool {
        self.kind == RelationKind::ManyToMany
    }

    /// Check if traversal yields at most one row.
    pub fn is_single(&self) -> bool {
        self.kind == RelationKind::ManyToOne
    }

    /// The leading local field. `None` only for a hand-built edge with no fields.
    pub fn local_field(&self) -> Option<&str> {
        self.local_fields.first().map(String::as_str)
    }

    /// The leading referenced field.
    pub fn referenced_field(&self) -> Option<&str> {
        self.referenced_fields.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_to_one_relation() {
        let rel = RelationDef::many_to_one("user", "posts", "userId", "users", "id");

        assert_eq!(rel.kind, RelationKind::ManyToOne);
        assert!(rel.is_single());
        assert_eq!(rel.local_field(), Some("userId"));
        assert_eq!(rel.referenced_field(), Some("id"));
        assert!(rel.through.is_none());
    }

    #[test]
    fn test_one_to_many_relation() {
        let rel = RelationDef::one_to_many("posts", "users", "id", "posts", "userId");

        assert_eq!(rel.kind, RelationKind::OneToMany);
        assert!(!rel.is_single());
        assert_eq!(rel.referenced_field(), Some("userId"));
    }

    #[test]
    fn test_many_to_many_relation() {
        let rel = RelationDef::many_to_many(
            "categories",
            "posts",
            "id",
            "categories",
            "id",
            JoinPath {
                table: "categoriesToPosts".into(),
                source_field: "postId".into(),
                target_field: "categoryId".into(),
            },
        );

        assert!(rel.is_many_to_many());
        assert_eq!(rel.through.unwrap().table, "categoriesToPosts");
    }

    #[test]
    fn test_edge_without_fields() {
        let rel = RelationDef {
            local_fields: Vec::new(),
            referenced_fields: Vec::new(),
            ..RelationDef::many_to_one("user", "posts", "userId", "users", "id")
        };

        assert_eq!(rel.local_field(), None);
        assert_eq!(rel.referenced_field(), None);
    }
}
