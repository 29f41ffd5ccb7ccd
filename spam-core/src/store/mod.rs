//! Prediction persistence
//!
//! Append-only log of classifications with aggregate statistics, stored as
//! one JSON document.

pub mod manager;
pub mod types;

pub use manager::PredictionStore;
pub use types::*;
