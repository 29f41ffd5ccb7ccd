//! Error types for spam-core

use thiserror::Error;

/// Result type alias for classification and storage operations
pub type Result<T> = std::result::Result<T, SpamError>;

/// Spam pipeline error types
#[derive(Error, Debug)]
pub enum SpamError {
    /// Model artifact missing, unparseable or inconsistent
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Caller supplied invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpamError {
    /// Whether the error was caused by the caller rather than the service
    pub fn is_validation(&self) -> bool {
        matches!(self, SpamError::Validation(_))
    }
}
