//! Configuration for spam-api

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use spam_core::predictor::{ModelArtifacts, ModelInfo, Predictor, PredictorConfig, DEFAULT_CONFIDENCE_SCALE};
use spam_core::{Result, SpamError};

/// Main service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model artifacts and calibration
    #[serde(default)]
    pub model: ModelConfig,
    /// Prediction store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Allowed CORS origins, "*" for any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Maximum characters per email text
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Maximum emails per batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

/// Model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Path to the TF-IDF vectorizer artifact
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: String,
    /// Path to the linear classifier artifact
    #[serde(default = "default_classifier_path")]
    pub classifier_path: String,
    /// Divisor mapping |decision score| to confidence, tied to the artifact
    #[serde(default = "default_confidence_scale")]
    pub confidence_scale: f64,
    /// Evaluation snapshot reported by /model-info
    #[serde(default)]
    pub info: ModelInfo,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON document holding all predictions
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_max_text_length() -> usize {
    100_000
}

fn default_max_batch_size() -> usize {
    100
}

fn default_vectorizer_path() -> String {
    "models/spam_vectorizer.json".to_string()
}

fn default_classifier_path() -> String {
    "models/spam_model_linear_svm.json".to_string()
}

fn default_confidence_scale() -> f64 {
    DEFAULT_CONFIDENCE_SCALE
}

fn default_database_path() -> String {
    "predictions_database.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors_origins: default_cors_origins(),
            max_text_length: default_max_text_length(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vectorizer_path: default_vectorizer_path(),
            classifier_path: default_classifier_path(),
            confidence_scale: default_confidence_scale(),
            info: ModelInfo::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ModelConfig {
    /// Load artifacts and build the predictor
    pub fn load_predictor(&self) -> Result<Predictor> {
        let artifacts = ModelArtifacts::load(&self.vectorizer_path, &self.classifier_path)?;
        Predictor::new(
            artifacts,
            PredictorConfig {
                confidence_scale: self.confidence_scale,
                info: self.info.clone(),
            },
        )
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpamError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SpamError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create a default development configuration
    pub fn development() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| {
                SpamError::Config(format!(
                    "Invalid listen address '{}': {}",
                    self.server.listen_addr, e
                ))
            })?;

        if self.server.max_batch_size == 0 {
            return Err(SpamError::Config("max_batch_size must be at least 1".to_string()));
        }

        if self.server.max_text_length == 0 {
            return Err(SpamError::Config("max_text_length must be at least 1".to_string()));
        }

        if self.model.vectorizer_path.is_empty() || self.model.classifier_path.is_empty() {
            return Err(SpamError::Config("Model artifact paths must be set".to_string()));
        }

        if !self.model.confidence_scale.is_finite() || self.model.confidence_scale <= 0.0 {
            return Err(SpamError::Config(format!(
                "confidence_scale must be positive, got {}",
                self.model.confidence_scale
            )));
        }

        if self.storage.database_path.is_empty() {
            return Err(SpamError::Config("database_path must be set".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.server.max_batch_size, 100);
        assert_eq!(config.model.confidence_scale, 3.0);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
listen_addr = "127.0.0.1:9000"

[model]
confidence_scale = 2.5

[model.info]
model_type = "Logistic Regression"
accuracy = 89.1
precision_ham = 0.9
precision_spam = 0.88
recall_ham = 0.86
recall_spam = 0.91
f1_ham = 0.88
f1_spam = 0.89
TN = 10
FP = 2
FN = 3
TP = 12

[logging]
format = "json"
"#;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.model.confidence_scale, 2.5);
        assert_eq!(config.model.info.model_type, "Logistic Regression");
        assert_eq!(config.model.info.true_positives, 12);
        assert_eq!(config.storage.database_path, "predictions_database.json");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServiceConfig::development();
        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::development();
        config.model.confidence_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::development();
        config.server.max_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::development();
        config.storage.database_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/spam-api.toml"));
        assert!(matches!(result, Err(SpamError::Config(_))));
    }
}
