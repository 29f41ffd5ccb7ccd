//! Linear spam classifier
//!
//! Linear SVM, logistic regression and multinomial Naive Bayes all reduce to
//! `w · x + b` for a binary problem, so one artifact shape covers the three
//! model families we evaluate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, SpamError};
use crate::vectorizer::SparseVector;

/// Model family the weights were fitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LinearSvm,
    LogisticRegression,
    /// Coefficients are per-feature log-probability differences, intercept
    /// is the class log-prior difference
    NaiveBayes,
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::LinearSvm => "Linear SVM",
            ModelFamily::LogisticRegression => "Logistic Regression",
            ModelFamily::NaiveBayes => "Naive Bayes",
        };
        f.write_str(name)
    }
}

/// Exported state of a fitted classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub model_type: ModelFamily,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Binary linear decision function
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    family: ModelFamily,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearClassifier {
    /// Load a classifier artifact from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpamError::Artifact(format!(
                "Failed to read classifier {}: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: ClassifierArtifact = serde_json::from_str(&content).map_err(|e| {
            SpamError::Artifact(format!(
                "Failed to parse classifier {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_artifact(artifact)
    }

    /// Build from an in-memory artifact
    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self> {
        if artifact.coefficients.is_empty() {
            return Err(SpamError::Artifact(
                "Classifier has no coefficients".to_string(),
            ));
        }

        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite())
        {
            return Err(SpamError::Artifact(
                "Classifier weights must be finite".to_string(),
            ));
        }

        Ok(Self {
            family: artifact.model_type,
            coefficients: artifact.coefficients,
            intercept: artifact.intercept,
        })
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Number of features the weights expect
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Signed distance to the decision boundary, positive leans spam
    pub fn decision_function(&self, features: &SparseVector) -> f64 {
        features.dot(&self.coefficients) + self.intercept
    }

    /// Class label for a decision score: 1 when strictly positive
    pub fn label_for(score: f64) -> u8 {
        if score > 0.0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(coefficients: Vec<f64>, intercept: f64) -> LinearClassifier {
        LinearClassifier::from_artifact(ClassifierArtifact {
            model_type: ModelFamily::LinearSvm,
            coefficients,
            intercept,
        })
        .unwrap()
    }

    #[test]
    fn test_decision_function() {
        let clf = classifier(vec![2.0, -1.0, 0.5], -0.25);
        let x = SparseVector::from_entries(vec![(2, 1.0), (0, 0.5)]);
        assert!((clf.decision_function(&x) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_row_scores_intercept() {
        let clf = classifier(vec![1.0], -0.7);
        assert_eq!(clf.decision_function(&SparseVector::default()), -0.7);
    }

    #[test]
    fn test_label_threshold_is_strict() {
        assert_eq!(LinearClassifier::label_for(0.01), 1);
        assert_eq!(LinearClassifier::label_for(0.0), 0);
        assert_eq!(LinearClassifier::label_for(-3.0), 0);
    }

    #[test]
    fn test_rejects_empty_weights() {
        let result = LinearClassifier::from_artifact(ClassifierArtifact {
            model_type: ModelFamily::LogisticRegression,
            coefficients: vec![],
            intercept: 0.0,
        });
        assert!(matches!(result, Err(SpamError::Artifact(_))));
    }

    #[test]
    fn test_rejects_non_finite_weights() {
        let result = LinearClassifier::from_artifact(ClassifierArtifact {
            model_type: ModelFamily::NaiveBayes,
            coefficients: vec![1.0, f64::NAN],
            intercept: 0.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_family_names() {
        assert_eq!(ModelFamily::LinearSvm.to_string(), "Linear SVM");
        let parsed: ModelFamily = serde_json::from_str("\"logistic_regression\"").unwrap();
        assert_eq!(parsed, ModelFamily::LogisticRegression);
    }
}
