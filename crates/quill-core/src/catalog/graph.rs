//! Relation graph: validated edges between table definitions.

use super::relation::{JoinPath, RelationDef};
use super::TableDef;
use crate::error::SchemaError;
use std::collections::HashMap;
use tracing::debug;

/// A directed multigraph of relations, indexed by source entity.
///
/// Cycles and self-references are allowed; traversal depth is the walker's
/// concern.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    relations: Vec<RelationDef>,
    by_source: HashMap<String, Vec<usize>>,
}

impl RelationGraph {
    /// Start declaring relations over the given tables.
    pub fn builder<'a>(tables: impl IntoIterator<Item = &'a TableDef>) -> GraphBuilder<'a> {
        GraphBuilder {
            tables: tables.into_iter().map(|t| (t.name.as_str(), t)).collect(),
            graph: RelationGraph::default(),
        }
    }

    /// Get a relation by source entity and name.
    pub fn relation(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.by_source
            .get(entity)?
            .iter()
            .map(|&i| &self.relations[i])
            .find(|r| r.name == name)
    }

    /// All relations whose source is `entity`, in declaration order.
    pub fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.by_source
            .get(entity)
            .map(|ids| ids.iter().map(|&i| &self.relations[i]).collect())
            .unwrap_or_default()
    }

    /// All relations whose target is `entity`.
    pub fn relations_to(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations.iter().filter(|r| r.target == entity).collect()
    }

    /// All relations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.iter()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    fn push(&mut self, relation: RelationDef) -> Result<(), SchemaError> {
        if self.relation(&relation.source, &relation.name).is_some() {
            return Err(SchemaError::DuplicateRelation {
                entity: relation.source,
                name: relation.name,
            });
        }

        debug!(
            entity = %relation.source,
            relation = %relation.name,
            target = %relation.target,
            kind = ?relation.kind,
            "Declared relation"
        );

        let idx = self.relations.len();
        self.by_source
            .entry(relation.source.clone())
            .or_default()
            .push(idx);
        self.relations.push(relation);
        Ok(())
    }
}

/// Declares and validates relations against a fixed set of tables.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    tables: HashMap<&'a str, &'a TableDef>,
    graph: RelationGraph,
}

impl<'a> GraphBuilder<'a> {
    /// Relate a child entity to its parent through a foreign-key column.
    ///
    /// Records `child.child_edge` (many-to-one) and `parent.parent_edge`
    /// (one-to-many).
    pub fn relate(
        &mut self,
        child: &str,
        foreign_key: &str,
        parent: &str,
        child_edge: &str,
        parent_edge: &str,
    ) -> Result<&mut Self, SchemaError> {
        let referenced = self.resolve_foreign_key(child, foreign_key, parent)?;

        self.graph.push(RelationDef::many_to_one(
            child_edge,
            child,
            foreign_key,
            parent,
            referenced.as_str(),
        ))?;
        self.graph.push(RelationDef::one_to_many(
            parent_edge,
            parent,
            referenced,
            child,
            foreign_key,
        ))?;
        Ok(self)
    }

    /// Relate two entities many-to-many through an explicit join table.
    ///
    /// The join table must carry one foreign key referencing each side's
    /// primary key. Records `a.a_edge -> b` and `b.b_edge -> a`.
    pub fn relate_many(
        &mut self,
        a: &str,
        b: &str,
        join_table: &str,
        a_edge: &str,
        b_edge: &str,
    ) -> Result<&mut Self, SchemaError> {
        let join = self.table(join_table, join_table, "", a)?;

        let a_field = join
            .fields
            .all()
            .iter()
            .find(|f| f.references_entity(a))
            .map(|f| f.name.clone())
            .ok_or_else(|| dangling(join_table, "", a, "join table has no column referencing it"))?;
        let b_field = join
            .fields
            .all()
            .iter()
            .find(|f| f.references_entity(b) && f.name != a_field)
            .map(|f| f.name.clone())
            .ok_or_else(|| dangling(join_table, "", b, "join table has no column referencing it"))?;

        let a_key = self.resolve_foreign_key(join_table, &a_field, a)?;
        let b_key = self.resolve_foreign_key(join_table, &b_field, b)?;

        self.graph.push(RelationDef::many_to_many(
            a_edge,
            a,
            a_key.as_str(),
            b,
            b_key.as_str(),
            JoinPath {
                table: join_table.to_string(),
                source_field: a_field.clone(),
                target_field: b_field.clone(),
            },
        ))?;
        self.graph.push(RelationDef::many_to_many(
            b_edge,
            b,
            b_key,
            a,
            a_key,
            JoinPath {
                table: join_table.to_string(),
                source_field: b_field,
                target_field: a_field,
            },
        ))?;
        Ok(self)
    }

    /// Finish declaring relations.
    pub fn build(self) -> RelationGraph {
        self.graph
    }

    fn table(
        &self,
        name: &str,
        entity: &str,
        field: &str,
        target: &str,
    ) -> Result<&'a TableDef, SchemaError> {
        self.tables
            .get(name)
            .copied()
            .ok_or_else(|| dangling(entity, field, target, format!("unknown entity '{name}'")))
    }

    /// Check `child.foreign_key` against `parent` and return the referenced
    /// primary-key field.
    fn resolve_foreign_key(
        &self,
        child: &str,
        foreign_key: &str,
        parent: &str,
    ) -> Result<String, SchemaError> {
        let child_table = self.table(child, child, foreign_key, parent)?;
        let parent_table = self.table(parent, child, foreign_key, parent)?;

        let fk = child_table
            .get_field(foreign_key)
            .ok_or_else(|| dangling(child, foreign_key, parent, "no such field"))?;

        let referenced = match &fk.references {
            Some(r) if r.entity != parent => {
                return Err(dangling(
                    child,
                    foreign_key,
                    parent,
                    format!("field is declared to reference '{}'", r.entity),
                ))
            }
            Some(r) => r.field.clone(),
            None => match parent_table.primary_key.fields() {
                [single] => single.clone(),
                _ => {
                    return Err(dangling(
                        child,
                        foreign_key,
                        parent,
                        "target key is composite; declare the referenced field",
                    ))
                }
            },
        };

        let pk = parent_table
            .get_field(&referenced)
            .filter(|_| parent_table.primary_key.contains(&referenced))
            .ok_or_else(|| {
                dangling(
                    child,
                    foreign_key,
                    parent,
                    format!("'{referenced}' is not part of the target primary key"),
                )
            })?;

        if !fk.field_type.is_join_compatible(&pk.field_type) {
            return Err(dangling(
                child,
                foreign_key,
                parent,
                format!(
                    "type {} does not match {}.{} ({})",
                    fk.field_type.tag(),
                    parent,
                    referenced,
                    pk.field_type.tag()
                ),
            ));
        }

        Ok(referenced)
    }
}

fn dangling(entity: &str, field: &str, target: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::DanglingReference {
        entity: entity.to_string(),
        field: field.to_string(),
        target: target.to_string(),
        reason: reason.into(),
    }
}
