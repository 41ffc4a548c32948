//! Tollgate - Service Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create the key-value store
//! 3. Load the routing table from the configured JSON files
//! 4. Mirror the routing table into the store for inspection
//! 5. Build the HTTP router and start serving

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tollgate::config::Config;
use tollgate::services::targets::{self, TargetTable};
use tollgate::state::AppState;
use tollgate::store::memory::MemoryStore;
use tollgate::store::KeyStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn KeyStore> = Arc::new(MemoryStore::new());

    // Load the routing table
    let descriptors = match config.targets_file.as_deref() {
        Some(path) => targets::read_descriptors(path)?,
        None => Vec::new(),
    };
    let rules = match config.cost_rules_file.as_deref() {
        Some(path) => targets::read_cost_rules(path)?,
        None => Vec::new(),
    };
    let table = TargetTable::new(descriptors, rules);
    if table.is_empty() {
        tracing::warn!("no targets configured, all proxied requests will be rejected");
    } else {
        tracing::info!(targets = table.len(), "routing table loaded");
    }

    // Mirror targets into the store so operators can inspect them
    targets::mirror_to_store(store.as_ref(), &table).await?;

    let port = config.port;
    let state = AppState::new(config, store, table)?;
    let app = tollgate::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
