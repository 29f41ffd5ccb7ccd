//! Spam predictor
//!
//! Composes normalizer, vectorizer and classifier into a single
//! `predict(text)` call with a bounded confidence value.

use serde::ser::SerializeStruct;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::classifier::LinearClassifier;
use crate::error::{Result, SpamError};
use crate::normalize::TextNormalizer;
use crate::vectorizer::TfidfVectorizer;

/// Decision scale that maps `|score|` onto `[0, 1]` for the shipped Linear
/// SVM. Must be re-derived whenever the classifier artifact changes.
pub const DEFAULT_CONFIDENCE_SCALE: f64 = 3.0;

/// Predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    /// Numeric class id, 1 for spam
    pub fn as_int(self) -> u8 {
        match self {
            Label::Spam => 1,
            Label::Ham => 0,
        }
    }

    pub fn from_int(label: u8) -> Self {
        if label == 1 {
            Label::Spam
        } else {
            Label::Ham
        }
    }

    pub fn is_spam(self) -> bool {
        self == Label::Spam
    }

    /// Check a stored numeric label against this class
    pub(crate) fn check_int<E: de::Error>(self, label: Option<u8>) -> std::result::Result<(), E> {
        match label {
            Some(label) if label != self.as_int() => Err(E::custom(format!(
                "label {} does not match prediction {}",
                label, self
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Spam => f.pad("Spam"),
            Label::Ham => f.pad("Ham"),
        }
    }
}

/// Classification of one email
///
/// The numeric `label` is serialized from `prediction` and never stored
/// separately.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: Label,
    pub confidence: f64,
    pub confidence_percentage: f64,
    pub raw_score: f64,
}

impl PredictionResult {
    /// Build a result from a raw decision score
    pub fn from_score(raw_score: f64, confidence_scale: f64) -> Self {
        let prediction = Label::from_int(LinearClassifier::label_for(raw_score));
        let confidence = (raw_score.abs() / confidence_scale).min(1.0);

        Self {
            prediction,
            confidence,
            confidence_percentage: confidence * 100.0,
            raw_score,
        }
    }

    /// Numeric class id, 1 for spam
    pub fn label(&self) -> u8 {
        self.prediction.as_int()
    }
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PredictionResult", 5)?;
        state.serialize_field("prediction", &self.prediction)?;
        state.serialize_field("label", &self.label())?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("confidence_percentage", &self.confidence_percentage)?;
        state.serialize_field("raw_score", &self.raw_score)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PredictionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            prediction: Label,
            label: Option<u8>,
            confidence: f64,
            confidence_percentage: f64,
            raw_score: f64,
        }

        let wire = Wire::deserialize(deserializer)?;
        wire.prediction.check_int::<D::Error>(wire.label)?;

        Ok(Self {
            prediction: wire.prediction,
            confidence: wire.confidence,
            confidence_percentage: wire.confidence_percentage,
            raw_score: wire.raw_score,
        })
    }
}

/// Offline evaluation snapshot of the deployed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub accuracy: f64,
    pub precision_ham: f64,
    pub precision_spam: f64,
    pub recall_ham: f64,
    pub recall_spam: f64,
    pub f1_ham: f64,
    pub f1_spam: f64,
    #[serde(rename = "TN")]
    pub true_negatives: u64,
    #[serde(rename = "FP")]
    pub false_positives: u64,
    #[serde(rename = "FN")]
    pub false_negatives: u64,
    #[serde(rename = "TP")]
    pub true_positives: u64,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            model_type: "Linear SVM".to_string(),
            accuracy: 90.50,
            precision_ham: 0.94,
            precision_spam: 0.88,
            recall_ham: 0.87,
            recall_spam: 0.94,
            f1_ham: 0.90,
            f1_spam: 0.91,
            true_negatives: 30374,
            false_positives: 4717,
            false_negatives: 2055,
            true_positives: 34166,
        }
    }
}

/// Predictor settings
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub confidence_scale: f64,
    pub info: ModelInfo,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            confidence_scale: DEFAULT_CONFIDENCE_SCALE,
            info: ModelInfo::default(),
        }
    }
}

/// Loaded, mutually consistent model artifacts
pub struct ModelArtifacts {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
}

impl ModelArtifacts {
    /// Bundle a vectorizer and classifier that agree on feature count
    pub fn new(vectorizer: TfidfVectorizer, classifier: LinearClassifier) -> Result<Self> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(SpamError::Artifact(format!(
                "Vectorizer produces {} features but classifier expects {}",
                vectorizer.n_features(),
                classifier.n_features()
            )));
        }

        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Load both artifacts from disk
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        vectorizer_path: P,
        classifier_path: Q,
    ) -> Result<Self> {
        let vectorizer = TfidfVectorizer::from_file(vectorizer_path)?;
        let classifier = LinearClassifier::from_file(classifier_path)?;
        let artifacts = Self::new(vectorizer, classifier)?;

        info!(
            "Model loaded: {} with {} features",
            artifacts.classifier.family(),
            artifacts.vectorizer.n_features()
        );

        Ok(artifacts)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }
}

/// Spam predictor over immutable artifacts
pub struct Predictor {
    normalizer: TextNormalizer,
    artifacts: ModelArtifacts,
    config: PredictorConfig,
}

impl Predictor {
    /// Create a predictor
    pub fn new(artifacts: ModelArtifacts, config: PredictorConfig) -> Result<Self> {
        if !config.confidence_scale.is_finite() || config.confidence_scale <= 0.0 {
            return Err(SpamError::Config(format!(
                "confidence_scale must be positive, got {}",
                config.confidence_scale
            )));
        }

        Ok(Self {
            normalizer: TextNormalizer::new(),
            artifacts,
            config,
        })
    }

    /// Classify raw email text
    ///
    /// Blank input is not rejected here; it normalizes to an empty row and
    /// scores the classifier intercept.
    pub fn predict(&self, text: &str) -> PredictionResult {
        let cleaned = self.normalizer.normalize(text);
        let features = self.artifacts.vectorizer.transform(&cleaned);
        let raw_score = self.artifacts.classifier.decision_function(&features);

        debug!(
            "Scored text ({} chars, {} active features): {:.4}",
            text.chars().count(),
            features.nnz(),
            raw_score
        );

        PredictionResult::from_score(raw_score, self.config.confidence_scale)
    }

    /// Evaluation snapshot of the loaded model
    pub fn model_info(&self) -> &ModelInfo {
        &self.config.info
    }

    pub fn confidence_scale(&self) -> f64 {
        self.config.confidence_scale
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierArtifact, ModelFamily};
    use crate::vectorizer::{Norm, VectorizerArtifact};

    fn predictor() -> Predictor {
        let terms = ["free", "cash", "win", "meeting", "agenda"];
        let vectorizer = TfidfVectorizer::from_artifact(VectorizerArtifact {
            vocabulary: terms
                .iter()
                .enumerate()
                .map(|(i, t)| (t.to_string(), i))
                .collect(),
            idf: vec![1.0; terms.len()],
            ngram_range: (1, 1),
            stop_words: vec![],
            sublinear_tf: false,
            norm: Some(Norm::L2),
        })
        .unwrap();

        let classifier = LinearClassifier::from_artifact(ClassifierArtifact {
            model_type: ModelFamily::LinearSvm,
            coefficients: vec![4.0, 4.0, 4.0, -4.0, -4.0],
            intercept: -0.1,
        })
        .unwrap();

        let artifacts = ModelArtifacts::new(vectorizer, classifier).unwrap();
        Predictor::new(artifacts, PredictorConfig::default()).unwrap()
    }

    #[test]
    fn test_predict_spam() {
        let result = predictor().predict("WIN FREE CASH NOW!!!");
        assert_eq!(result.prediction, Label::Spam);
        assert_eq!(result.label(), 1);
        assert!(result.raw_score > 0.0);
    }

    #[test]
    fn test_predict_ham() {
        let result = predictor().predict("Agenda for tomorrow's meeting");
        assert_eq!(result.prediction, Label::Ham);
        assert_eq!(result.label(), 0);
        assert!(result.raw_score < 0.0);
    }

    #[test]
    fn test_urls_do_not_leak_into_features() {
        let p = predictor();
        let with_url = p.predict("meeting agenda http://free-cash.example/win");
        let without_url = p.predict("meeting agenda");
        assert_eq!(with_url, without_url);
    }

    #[test]
    fn test_unknown_text_scores_intercept() {
        let result = predictor().predict("zzz qqq");
        assert_eq!(result.raw_score, -0.1);
        assert_eq!(result.prediction, Label::Ham);
    }

    #[test]
    fn test_confidence_clamped_at_scale() {
        for score in [3.0, -3.0, 7.5, -42.0] {
            let result = PredictionResult::from_score(score, DEFAULT_CONFIDENCE_SCALE);
            assert_eq!(result.confidence, 1.0);
            assert_eq!(result.confidence_percentage, 100.0);
        }
    }

    #[test]
    fn test_confidence_scaled_below_clamp() {
        let result = PredictionResult::from_score(1.5, DEFAULT_CONFIDENCE_SCALE);
        assert!((result.confidence - 0.5).abs() < 1e-12);
        assert!((result.confidence_percentage - 50.0).abs() < 1e-9);
        assert_eq!(result.raw_score, 1.5);
    }

    #[test]
    fn test_label_matches_prediction() {
        for score in [-2.0, -0.0, 0.0, 0.3, 9.0] {
            let result = PredictionResult::from_score(score, DEFAULT_CONFIDENCE_SCALE);
            assert_eq!(result.label() == 1, result.prediction == Label::Spam);
            assert_eq!(result.confidence_percentage, result.confidence * 100.0);
        }
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let artifacts = ModelArtifacts::new(
            TfidfVectorizer::from_artifact(VectorizerArtifact {
                vocabulary: [("free".to_string(), 0)].into_iter().collect(),
                idf: vec![1.0],
                ngram_range: (1, 1),
                stop_words: vec![],
                sublinear_tf: false,
                norm: None,
            })
            .unwrap(),
            LinearClassifier::from_artifact(ClassifierArtifact {
                model_type: ModelFamily::LinearSvm,
                coefficients: vec![1.0],
                intercept: 0.0,
            })
            .unwrap(),
        )
        .unwrap();

        let config = PredictorConfig {
            confidence_scale: 0.0,
            ..PredictorConfig::default()
        };
        assert!(matches!(Predictor::new(artifacts, config), Err(SpamError::Config(_))));
    }

    #[test]
    fn test_rejects_feature_count_mismatch() {
        let vectorizer = TfidfVectorizer::from_artifact(VectorizerArtifact {
            vocabulary: [("free".to_string(), 0)].into_iter().collect(),
            idf: vec![1.0],
            ngram_range: (1, 1),
            stop_words: vec![],
            sublinear_tf: false,
            norm: None,
        })
        .unwrap();
        let classifier = LinearClassifier::from_artifact(ClassifierArtifact {
            model_type: ModelFamily::LinearSvm,
            coefficients: vec![1.0, 2.0],
            intercept: 0.0,
        })
        .unwrap();

        assert!(matches!(
            ModelArtifacts::new(vectorizer, classifier),
            Err(SpamError::Artifact(_))
        ));
    }

    #[test]
    fn test_model_info_serializes_confusion_counts() {
        let json = serde_json::to_value(ModelInfo::default()).unwrap();
        assert_eq!(json["model_type"], "Linear SVM");
        assert_eq!(json["TN"], 30374);
        assert_eq!(json["TP"], 34166);
        assert_eq!(json["accuracy"], 90.5);
    }

    #[test]
    fn test_result_label_follows_prediction_on_the_wire() {
        let mut result = PredictionResult::from_score(2.0, DEFAULT_CONFIDENCE_SCALE);
        assert_eq!(serde_json::to_value(&result).unwrap()["label"], 1);

        result.prediction = Label::Ham;
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["prediction"], "Ham");
        assert_eq!(json["label"], 0);
    }

    #[test]
    fn test_result_rejects_mismatched_label() {
        let json = r#"{"prediction":"Spam","label":0,"confidence":0.5,"confidence_percentage":50.0,"raw_score":1.5}"#;
        assert!(serde_json::from_str::<PredictionResult>(json).is_err());

        let json = r#"{"prediction":"Spam","label":1,"confidence":0.5,"confidence_percentage":50.0,"raw_score":1.5}"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.label(), 1);
    }
}
