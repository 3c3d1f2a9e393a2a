//! Declarative schema catalog.
//!
//! Field schemas, the audit mixin, table definitions, the relation graph, and
//! the exporter that makes them discoverable by entity name and route.

pub mod audit;
mod exporter;
mod field;
mod graph;
mod relation;
mod schema;
mod table;
mod types;

pub use audit::{compose_schema, TableFields, CREATED_ON, UPDATED_ON};
pub use exporter::{Catalog, CatalogBuilder, RouteBinding, SchemaExporter};
pub use field::{FieldDef, FieldRef};
pub use graph::{GraphBuilder, RelationGraph};
pub use relation::{JoinPath, RelationDef, RelationKind};
pub use schema::FieldSchema;
pub use table::{IndexDef, PrimaryKey, TableBuilder, TableDef};
pub use types::FieldType;
