//! spam-api: REST API for email spam classification
//!
//! Wraps the `spam-core` predictor and prediction store in an HTTP service.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:8000"
//! cors_origins = ["http://localhost:3000"]
//!
//! [model]
//! vectorizer_path = "models/spam_vectorizer.json"
//! classifier_path = "models/spam_model_linear_svm.json"
//! confidence_scale = 3.0
//!
//! [storage]
//! database_path = "predictions_database.json"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use api::{ApiServer, AppState};
pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
