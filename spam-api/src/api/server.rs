//! API Server - HTTP server for REST API

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::handlers::{self, AppState};
use crate::config::ServerConfig;

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
    cors_origins: Vec<String>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>, config: &ServerConfig) -> Self {
        Self {
            state,
            addr: config.listen_addr.clone(),
            cors_origins: config.cors_origins.clone(),
        }
    }

    /// CORS layer for the configured origins
    fn cors(&self) -> CorsLayer {
        let allow_origin = if self.cors_origins.iter().any(|o| o == "*") {
            AllowOrigin::from(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .cors_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/predict", post(handlers::predict))
            .route("/predict-batch", post(handlers::predict_batch))
            .route("/model-info", get(handlers::model_info))
            .route(
                "/predictions",
                get(handlers::list_predictions).delete(handlers::clear_predictions),
            )
            .route("/predictions/range", get(handlers::predictions_in_range))
            .route("/statistics", get(handlers::statistics))
            .route("/export/csv", get(handlers::export_csv))
            .route("/export/json", get(handlers::export_json))
            .layer(TraceLayer::new_for_http())
            .layer(self.cors())
            .with_state(self.state.clone())
    }

    /// Start the API server
    pub async fn run(&self) -> std::io::Result<()> {
        let router = self.router();

        info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
