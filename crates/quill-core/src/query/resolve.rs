//! Relation traversal over the reference store.

use crate::catalog::{Catalog, RelationDef, RelationKind, SchemaExporter, TableDef};
use crate::error::Error;
use crate::storage::{Row, StorageEngine};
use serde::Serialize;
use serde_json::Value;

/// Rows reached by following one relation from one source row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Related {
    /// Many-to-one: the referenced row, if the key resolves.
    One(Option<Row>),
    /// One-to-many and many-to-many: every related row, in stable order.
    Many(Vec<Row>),
}

impl Related {
    /// Number of related rows.
    pub fn len(&self) -> usize {
        match self {
            Related::One(row) => usize::from(row.is_some()),
            Related::Many(rows) => rows.len(),
        }
    }

    /// Whether nothing was reached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list of rows.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Related::One(row) => row.into_iter().collect(),
            Related::Many(rows) => rows,
        }
    }
}

/// Follows relation edges declared in a catalog against a storage engine.
pub struct RelationResolver<'a> {
    storage: &'a StorageEngine,
    catalog: &'a Catalog,
}

impl<'a> RelationResolver<'a> {
    /// Create a resolver.
    pub fn new(storage: &'a StorageEngine, catalog: &'a Catalog) -> Self {
        Self { storage, catalog }
    }

    /// Resolve `relation` from a row of `entity`.
    pub fn resolve(&self, entity: &str, row: &Row, relation: &str) -> Result<Related, Error> {
        if self.catalog.lookup_table(entity).is_none() {
            return Err(Error::UnknownEntity(entity.to_string()));
        }
        let rel = self
            .catalog
            .relations()
            .relation(entity, relation)
            .ok_or_else(|| Error::UnknownRelation {
                entity: entity.to_string(),
                relation: relation.to_string(),
            })?;
        let target = self.table(&rel.target)?;

        let local = rel
            .local_field()
            .and_then(|field| row.get(field))
            .filter(|v| !v.is_null());
        let (Some(local), Some(referenced)) = (local, rel.referenced_field()) else {
            return Ok(match rel.kind {
                RelationKind::ManyToOne => Related::One(None),
                _ => Related::Many(Vec::new()),
            });
        };

        match rel.kind {
            RelationKind::ManyToOne => self
                .resolve_parent(target, rel, referenced, local)
                .map(Related::One),
            RelationKind::OneToMany => self
                .storage
                .find_by(target, referenced, local)
                .map(Related::Many),
            RelationKind::ManyToMany => self
                .resolve_through(target, rel, referenced, local)
                .map(Related::Many),
        }
    }

    fn resolve_parent(
        &self,
        target: &TableDef,
        rel: &RelationDef,
        referenced: &str,
        local: &Value,
    ) -> Result<Option<Row>, Error> {
        if target.primary_key.fields() == rel.referenced_fields.as_slice() {
            return self.storage.get(target, std::slice::from_ref(local));
        }
        Ok(self
            .storage
            .find_by(target, referenced, local)?
            .into_iter()
            .next())
    }

    fn resolve_through(
        &self,
        target: &TableDef,
        rel: &RelationDef,
        referenced: &str,
        local: &Value,
    ) -> Result<Vec<Row>, Error> {
        let Some(path) = &rel.through else {
            return Ok(Vec::new());
        };
        let join = self.table(&path.table)?;

        let mut rows = Vec::new();
        for link in self.storage.find_by(join, &path.source_field, local)? {
            let Some(key) = link.get(&path.target_field) else {
                continue;
            };
            if let Some(row) = self.resolve_parent(target, rel, referenced, key)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn table(&self, name: &str) -> Result<&'a TableDef, Error> {
        self.catalog
            .lookup_table(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }
}
