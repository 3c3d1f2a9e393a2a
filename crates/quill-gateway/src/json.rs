//! JSON request and response types for the HTTP gateway.

use quill_core::catalog::{FieldDef, IndexDef, PrimaryKey, RelationDef, RouteBinding};
use serde::Serialize;

/// Generic success response wrapper.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    /// Success flag.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    /// Create a new success response.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Number of mounted entities.
    pub entities: usize,
}

/// Route table response.
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    /// Success flag.
    pub success: bool,
    /// One binding per entity, in mount order.
    pub routes: Vec<RouteBinding>,
}

/// A table definition with its relations.
#[derive(Debug, Serialize)]
pub struct TableSchema {
    /// Table (entity) name.
    pub table: String,
    /// Route path segment.
    pub route: String,
    /// Columns, audit fields last.
    pub fields: Vec<FieldDef>,
    /// Primary key columns.
    pub primary_key: PrimaryKey,
    /// Secondary indexes.
    pub indexes: Vec<IndexDef>,
    /// Relations whose source is this entity.
    pub relations: Vec<RelationDef>,
}
