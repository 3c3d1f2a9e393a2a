//! Quill HTTP/JSON Gateway.
//!
//! Mounts one handler set per entity in the catalog's route table and
//! serves schema introspection alongside.

pub mod config;
pub mod error;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use error::AppError;

use std::sync::Arc;

use axum::Router;
use quill_core::{Catalog, SchemaExporter, StorageEngine};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Schema catalog, immutable after startup.
    pub catalog: Arc<Catalog>,
    /// Row store.
    pub storage: Arc<StorageEngine>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(catalog: Catalog, storage: StorageEngine, config: GatewayConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            storage: Arc::new(storage),
            config,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let config = &state.config;
    let mut router = Router::new()
        .merge(routes::health::routes())
        .merge(routes::schema::routes(config));

    for binding in state.catalog.get_routes() {
        let path = config.api_path(&binding.route);
        debug!(table = %binding.table, path = %path, "Mounting entity routes");
        router = router.nest(&path, routes::entity::routes(&binding.table));
    }

    router
        .fallback(|| async { AppError::NotFound("no such route".to_string()) })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
