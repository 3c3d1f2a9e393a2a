//! Schema exporter: the name-keyed registry of schemas, tables, and routes.

use super::graph::{GraphBuilder, RelationGraph};
use super::table::TableBuilder;
use super::{FieldSchema, TableDef};
use crate::error::SchemaError;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// One entry of the route table: an entity's table name and its path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteBinding {
    /// Physical table (entity) name.
    pub table: String,
    /// Externally exposed path segment.
    pub route: String,
}

impl RouteBinding {
    /// Create a route binding.
    pub fn new(table: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            route: route.into(),
        }
    }
}

/// Resolves entity names to schemas, tables, and routes.
///
/// Lookups return `None` for unknown names. A missing entity is an expected
/// outcome of dispatching an untrusted path segment.
pub trait SchemaExporter {
    /// Every entity's route binding, in declaration order.
    fn get_routes(&self) -> Vec<RouteBinding>;

    /// The entity's own fields, without audit fields.
    fn lookup_schema(&self, name: &str) -> Option<&FieldSchema>;

    /// The entity's bound table definition.
    fn lookup_table(&self, name: &str) -> Option<&TableDef>;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    schema: FieldSchema,
    table: TableDef,
    route: String,
}

/// Immutable catalog of every declared entity and relation.
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_route: HashMap<String, usize>,
    relations: RelationGraph,
}

impl Catalog {
    /// Start declaring a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Resolve a route path segment to its entity name.
    pub fn lookup_route(&self, route: &str) -> Option<&str> {
        self.by_route
            .get(route)
            .map(|&i| self.entries[i].table.name.as_str())
    }

    /// The route segment bound to an entity.
    pub fn route_of(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|e| e.route.as_str())
    }

    /// The relation graph.
    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    /// Entity names in declaration order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.table.name.as_str())
    }

    /// Table definitions in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.entries.iter().map(|e| &e.table)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog declares no entities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }
}

impl SchemaExporter for Catalog {
    fn get_routes(&self) -> Vec<RouteBinding> {
        self.entries
            .iter()
            .map(|e| RouteBinding::new(e.table.name.as_str(), e.route.as_str()))
            .collect()
    }

    fn lookup_schema(&self, name: &str) -> Option<&FieldSchema> {
        self.entry(name).map(|e| &e.schema)
    }

    fn lookup_table(&self, name: &str) -> Option<&TableDef> {
        self.entry(name).map(|e| &e.table)
    }
}

/// Builder for [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_route: HashMap<String, usize>,
}

impl CatalogBuilder {
    /// Register an entity with its route.
    ///
    /// The table definition is composed from `schema` here, so a schema and
    /// its table can never drift apart. `define` declares indexes or a
    /// composite key.
    pub fn entity<F>(
        mut self,
        schema: FieldSchema,
        route: impl Into<String>,
        define: F,
    ) -> Result<Self, SchemaError>
    where
        F: FnOnce(TableBuilder<'_>) -> TableBuilder<'_>,
    {
        let route = route.into();
        let name = schema.entity.clone();

        if self.by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateEntity(name));
        }
        if let Some(&existing) = self.by_route.get(&route) {
            return Err(SchemaError::DuplicateRoute {
                route,
                existing: self.entries[existing].table.name.clone(),
                entity: name,
            });
        }

        let table = define(TableDef::builder(&schema)).build()?;
        debug!(
            entity = %name,
            route = %route,
            columns = table.fields.len(),
            indexes = table.indexes.len(),
            "Registered entity"
        );

        let idx = self.entries.len();
        self.by_name.insert(name, idx);
        self.by_route.insert(route.clone(), idx);
        self.entries.push(CatalogEntry {
            schema,
            table,
            route,
        });
        Ok(self)
    }

    /// Finish without relations.
    pub fn build(self) -> Result<Catalog, SchemaError> {
        self.build_with_relations(|_| Ok(()))
    }

    /// Declare relations over the registered tables and finish.
    pub fn build_with_relations<F>(self, declare: F) -> Result<Catalog, SchemaError>
    where
        F: FnOnce(&mut GraphBuilder<'_>) -> Result<(), SchemaError>,
    {
        let relations = {
            let mut graph = RelationGraph::builder(self.entries.iter().map(|e| &e.table));
            declare(&mut graph)?;
            graph.build()
        };

        info!(
            entities = self.entries.len(),
            relations = relations.len(),
            "Schema catalog built"
        );

        Ok(Catalog {
            entries: self.entries,
            by_name: self.by_name,
            by_route: self.by_route,
            relations,
        })
    }
}
