//! REST API
//!
//! HTTP façade over the predictor and the prediction store.

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::ApiServer;
