//! Schema introspection endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use quill_core::SchemaExporter;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::json::{RoutesResponse, SuccessResponse, TableSchema};
use crate::AppState;

/// Schema routes, under the API prefix.
pub fn routes(config: &GatewayConfig) -> Router<AppState> {
    Router::new()
        .route(&config.api_path("schema"), get(handle_get_routes))
        .route(&config.api_path("schema/:table"), get(handle_get_table))
}

/// Handle route table request.
async fn handle_get_routes(State(state): State<AppState>) -> Json<RoutesResponse> {
    Json(RoutesResponse {
        success: true,
        routes: state.catalog.get_routes(),
    })
}

/// Handle table definition request.
async fn handle_get_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<SuccessResponse<TableSchema>>, AppError> {
    let catalog = &state.catalog;
    let def = catalog
        .lookup_table(&table)
        .ok_or_else(|| AppError::NotFound(format!("unknown entity '{table}'")))?;

    Ok(Json(SuccessResponse::new(TableSchema {
        table: def.name.clone(),
        route: catalog.route_of(&def.name).unwrap_or_default().to_string(),
        fields: def.fields.all().to_vec(),
        primary_key: def.primary_key.clone(),
        indexes: def.indexes.clone(),
        relations: catalog
            .relations()
            .relations_from(&def.name)
            .into_iter()
            .cloned()
            .collect(),
    })))
}
