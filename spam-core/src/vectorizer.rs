//! TF-IDF feature extraction
//!
//! Rebuilds a fitted TF-IDF vectorizer from its exported artifact and turns
//! cleaned text into a sparse, normalized feature row.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::error::{Result, SpamError};

/// Row normalization applied after TF-IDF weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Exported state of a fitted vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    /// Term to feature column
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column
    pub idf: Vec<f64>,
    /// Inclusive word n-gram range
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    /// Words dropped before n-grams are built
    #[serde(default)]
    pub stop_words: Vec<String>,
    /// Use `1 + ln(tf)` instead of raw counts
    #[serde(default)]
    pub sublinear_tf: bool,
    /// Row normalization, `null` for none
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Sparse feature row, sorted by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from `(column, value)` pairs
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(column, _)| *column);
        Self { entries }
    }

    /// Non-zero entries in column order
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Value at a column, zero if absent
    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product with a dense weight vector
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|(column, value)| weights.get(*column).map(|w| w * value))
            .sum()
    }
}

/// Fitted TF-IDF vectorizer
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    min_n: usize,
    max_n: usize,
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    norm: Option<Norm>,
    token_pattern: Regex,
}

impl TfidfVectorizer {
    /// Load a vectorizer artifact from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpamError::Artifact(format!(
                "Failed to read vectorizer {}: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: VectorizerArtifact = serde_json::from_str(&content).map_err(|e| {
            SpamError::Artifact(format!(
                "Failed to parse vectorizer {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_artifact(artifact)
    }

    /// Build from an in-memory artifact, checking its consistency
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let n_features = artifact.idf.len();

        if artifact.vocabulary.len() != n_features {
            return Err(SpamError::Artifact(format!(
                "Vocabulary has {} terms but idf has {} weights",
                artifact.vocabulary.len(),
                n_features
            )));
        }

        if let Some((term, column)) = artifact
            .vocabulary
            .iter()
            .find(|(_, column)| **column >= n_features)
        {
            return Err(SpamError::Artifact(format!(
                "Term '{}' maps to column {} outside {} features",
                term, column, n_features
            )));
        }

        let distinct: HashSet<usize> = artifact.vocabulary.values().copied().collect();
        if distinct.len() != n_features {
            return Err(SpamError::Artifact(
                "Vocabulary maps several terms to the same column".to_string(),
            ));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamError::Artifact(format!(
                "Invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            min_n,
            max_n,
            stop_words: artifact.stop_words.into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            token_pattern: Regex::new(r"\b\w\w+\b").expect("token pattern is valid"),
        })
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Split cleaned text into stop-word-filtered word n-grams
    fn analyze(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let mut terms = Vec::new();
        for n in self.min_n..=self.max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Turn cleaned text into a TF-IDF row
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (column, tf * self.idf[column])
            })
            .collect();

        let scale = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 1.0,
        };

        if scale > 0.0 {
            for (_, value) in entries.iter_mut() {
                *value /= scale;
            }
        }

        SparseVector::from_entries(entries)
    }
}
