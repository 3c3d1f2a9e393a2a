//! Quill HTTP/JSON Gateway binary.

use anyhow::Context;
use clap::Parser;
use quill_core::{project, SchemaExporter, StorageEngine};
use quill_gateway::{create_router, AppState, Args, GatewayConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line args
    let args = Args::parse();
    let config = GatewayConfig::from(&args);

    info!(
        listen = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        temporary = config.temporary,
        "Starting Quill Gateway"
    );

    // A malformed schema aborts before anything is mounted
    let catalog = project::catalog().context("invalid schema declaration")?;
    info!(
        entities = catalog.len(),
        relations = catalog.relations().len(),
        "Schema catalog loaded"
    );
    for binding in catalog.get_routes() {
        info!(table = %binding.table, route = %binding.route, "Route binding");
    }

    let storage = StorageEngine::open(config.storage_config())
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;
    if storage.was_recovered() {
        info!("Recovered existing data store");
    }

    // Create application state
    let state = AppState::new(catalog, storage, config.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
