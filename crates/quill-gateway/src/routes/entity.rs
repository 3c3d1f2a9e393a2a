//! Per-entity CRUD and relation endpoints.
//!
//! One router is mounted per route binding; the entity it serves is carried
//! as a request extension and resolved against the catalog on every request.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use quill_core::catalog::{FieldType, TableDef};
use quill_core::{RelationResolver, Related, Row, SchemaExporter};
use serde_json::Value;

use crate::error::AppError;
use crate::json::SuccessResponse;
use crate::AppState;

/// Separator between components of a composite key in a path segment.
const KEY_SEPARATOR: char = ',';

/// The entity a mounted router serves.
#[derive(Debug, Clone)]
pub struct EntityName(pub String);

/// Routes for one entity.
pub fn routes(entity: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(handle_list).post(handle_create))
        .route(
            "/:id",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route("/:id/:relation", get(handle_related))
        .layer(Extension(EntityName(entity.to_string())))
}

fn lookup<'a>(state: &'a AppState, entity: &EntityName) -> Result<&'a TableDef, AppError> {
    state
        .catalog
        .lookup_table(&entity.0)
        .ok_or_else(|| AppError::NotFound(format!("unknown entity '{}'", entity.0)))
}

/// Interpret a path or query string value according to a column's type.
fn typed_value(table: &TableDef, field: &str, raw: &str) -> Result<Value, AppError> {
    let def = table
        .get_field(field)
        .ok_or_else(|| AppError::BadRequest(format!("unknown field '{field}'")))?;

    match def.field_type {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| AppError::BadRequest(format!("field '{field}' expects an integer"))),
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Split a key path segment into typed key values, in key order.
fn key_values(table: &TableDef, id: &str) -> Result<Vec<Value>, AppError> {
    let fields = table.primary_key.fields();
    let parts: Vec<&str> = if fields.len() == 1 {
        vec![id]
    } else {
        id.split(KEY_SEPARATOR).collect()
    };

    if parts.len() != fields.len() {
        return Err(AppError::BadRequest(format!(
            "'{}' is keyed by {} values ({})",
            table.name,
            fields.len(),
            fields.join(", ")
        )));
    }

    fields
        .iter()
        .zip(parts)
        .map(|(field, raw)| typed_value(table, field, raw))
        .collect()
}

fn into_row(table: &TableDef, body: Value) -> Result<Row, AppError> {
    match body {
        Value::Object(row) => Ok(row),
        _ => Err(AppError::BadRequest(format!(
            "'{}' rows must be JSON objects",
            table.name
        ))),
    }
}

/// Run storage work on the blocking pool. sled calls may block on disk I/O.
async fn run_blocking<T, F>(state: AppState, work: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Storage task failed");
            AppError::Internal(format!("storage task failed: {e}"))
        })?
}

fn row_not_found(table: &TableDef, id: &str) -> AppError {
    AppError::NotFound(format!("no '{}' row with key '{id}'", table.name))
}

/// List rows, optionally filtered by `?field=value` equality.
async fn handle_list(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Query(filter): Query<HashMap<String, String>>,
) -> Result<Json<SuccessResponse<Vec<Row>>>, AppError> {
    let rows = run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;

        let mut conditions = Vec::with_capacity(filter.len());
        for (field, raw) in &filter {
            conditions.push((field.as_str(), typed_value(table, field, raw)?));
        }

        let mut rows = match conditions.first() {
            Some((field, value)) => state.storage.find_by(table, field, value)?,
            None => state.storage.scan(table)?,
        };
        rows.retain(|row| {
            conditions
                .iter()
                .all(|(field, value)| row.get(*field) == Some(value))
        });
        Ok(rows)
    })
    .await?;

    Ok(Json(SuccessResponse::new(rows)))
}

/// Insert a row.
async fn handle_create(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SuccessResponse<Row>>), AppError> {
    let row = run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;
        Ok(state.storage.insert(table, into_row(table, body)?)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(row))))
}

/// Fetch a row by key.
async fn handle_get(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<Row>>, AppError> {
    let row = run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;
        state
            .storage
            .get(table, &key_values(table, &id)?)?
            .ok_or_else(|| row_not_found(table, &id))
    })
    .await?;

    Ok(Json(SuccessResponse::new(row)))
}

/// Merge fields into an existing row. Key fields come from the path.
async fn handle_update(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SuccessResponse<Row>>, AppError> {
    let row = run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;
        let mut changes = into_row(table, body)?;
        for (field, value) in table.primary_key.fields().iter().zip(key_values(table, &id)?) {
            changes.insert(field.clone(), value);
        }

        state
            .storage
            .update(table, changes)?
            .ok_or_else(|| row_not_found(table, &id))
    })
    .await?;

    Ok(Json(SuccessResponse::new(row)))
}

/// Delete a row by key.
async fn handle_delete(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;
        match state.storage.delete(table, &key_values(table, &id)?)? {
            Some(_) => Ok(StatusCode::NO_CONTENT),
            None => Err(row_not_found(table, &id)),
        }
    })
    .await
}

/// Follow a relation from a row.
async fn handle_related(
    State(state): State<AppState>,
    Extension(entity): Extension<EntityName>,
    Path((id, relation)): Path<(String, String)>,
) -> Result<Json<SuccessResponse<Related>>, AppError> {
    let related = run_blocking(state, move |state| {
        let table = lookup(state, &entity)?;
        let row = state
            .storage
            .get(table, &key_values(table, &id)?)?
            .ok_or_else(|| row_not_found(table, &id))?;

        Ok(RelationResolver::new(&state.storage, &state.catalog)
            .resolve(&table.name, &row, &relation)?)
    })
    .await?;

    Ok(Json(SuccessResponse::new(related)))
}
