//! spam-core: Email spam classification pipeline
//!
//! Turns raw email text into a spam/ham decision with a confidence score and
//! keeps a durable log of every decision.
//!
//! # Pipeline
//!
//! - **Normalizer**: lowercases, strips URLs, keeps only `a-z` and spaces
//! - **Vectorizer**: fitted TF-IDF artifact (vocabulary, idf, n-grams)
//! - **Classifier**: fitted linear decision function (SVM, logistic
//!   regression or Naive Bayes weights)
//! - **Predictor**: `min(1, |score| / scale)` confidence on top
//!
//! # Example
//!
//! ```no_run
//! use spam_core::predictor::{ModelArtifacts, Predictor, PredictorConfig};
//! use spam_core::store::{NewPrediction, PredictionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let artifacts = ModelArtifacts::load("models/spam_vectorizer.json", "models/spam_model.json")?;
//!     let predictor = Predictor::new(artifacts, PredictorConfig::default())?;
//!     let store = PredictionStore::open("predictions_database.json").await?;
//!
//!     let text = "Congratulations! You've won a free iPhone.";
//!     let result = predictor.predict(text);
//!     store.append(NewPrediction::new(text, result)).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`normalize`]: text cleaning
//! - [`vectorizer`]: TF-IDF features
//! - [`classifier`]: linear decision function
//! - [`predictor`]: end-to-end prediction and model info
//! - [`store`]: JSON prediction store
//! - [`error`]: error types

pub mod classifier;
pub mod error;
pub mod normalize;
pub mod predictor;
pub mod store;
pub mod vectorizer;

// Re-export commonly used types
pub use error::{Result, SpamError};
pub use predictor::{Label, ModelArtifacts, ModelInfo, PredictionResult, Predictor, PredictorConfig};
pub use store::{NewPrediction, PredictionRecord, PredictionStats, PredictionStore, StoreMetadata};
