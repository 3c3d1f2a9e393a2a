//! Quill Core - schema catalog, relation graph, and route table.
//!
//! Entities are declared once as field schemas; the catalog composes audit
//! fields into table definitions, validates relations, and exposes everything
//! by entity name and route for storage and HTTP collaborators.

pub mod catalog;
pub mod error;
pub mod project;
pub mod query;
pub mod storage;

pub use catalog::{
    Catalog, CatalogBuilder, FieldDef, FieldSchema, FieldType, IndexDef, PrimaryKey,
    RelationDef, RelationGraph, RelationKind, RouteBinding, SchemaExporter, TableDef,
};
pub use error::{Error, SchemaError};
pub use query::{Related, RelationResolver};
pub use storage::{Row, StorageConfig, StorageEngine};
