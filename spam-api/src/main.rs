//! spam-api: Spam Email Detection Server

use spam_api::{logging, ApiServer, AppState, ServiceConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => ServiceConfig::from_file(Path::new(path))?,
        None => ServiceConfig::development(),
    };
    config.validate()?;

    // Initialize logging
    logging::init(&config.logging);

    info!("Starting spam-api v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration loaded from {}", path),
        None => info!("No config file specified, using development defaults"),
    }

    let state = Arc::new(AppState::initialize(&config).await);
    if state.predictor.is_err() || state.store.is_err() {
        warn!("Starting in degraded mode, see /health");
    }

    let server = ApiServer::new(state, &config.server);
    server.run().await?;

    Ok(())
}
