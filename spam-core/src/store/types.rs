//! Prediction store types and data structures

use chrono::Utc;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::predictor::{Label, PredictionResult};

/// Document format version written to metadata
pub const STORE_VERSION: &str = "1.0";

/// Characters of the original email kept per record
pub const EMAIL_TEXT_LIMIT: usize = 200;

/// CSV export header
pub const CSV_HEADER: &str = "ID,Timestamp,Prediction,Confidence %,Label";

/// Current UTC time as ISO-8601 with fixed microsecond width, so string
/// order matches chronological order
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Sequential record id, 1-based
pub fn format_id(sequence: usize) -> String {
    format!("pred_{:06}", sequence)
}

/// Round to 2 decimal places, ties to even on the exact binary value
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// A prediction waiting to be stored
#[derive(Debug, Clone)]
pub struct NewPrediction {
    /// Original, uncleaned email text
    pub text: String,
    pub result: PredictionResult,
}

impl NewPrediction {
    pub fn new(text: impl Into<String>, result: PredictionResult) -> Self {
        Self {
            text: text.into(),
            result,
        }
    }
}

/// One stored classification
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    /// `pred_NNNNNN`
    pub id: String,
    /// ISO-8601 UTC creation time
    pub timestamp: String,
    /// First 200 characters of the original text
    pub email_text: String,
    pub prediction: Label,
    pub confidence: f64,
    pub confidence_percentage: f64,
    pub raw_score: f64,
}

impl PredictionRecord {
    /// Finalize a pending prediction with its id and timestamp
    pub fn new(id: String, timestamp: String, pending: &NewPrediction) -> Self {
        let result = &pending.result;
        Self {
            id,
            timestamp,
            email_text: pending.text.chars().take(EMAIL_TEXT_LIMIT).collect(),
            prediction: result.prediction,
            confidence: result.confidence,
            confidence_percentage: result.confidence_percentage,
            raw_score: result.raw_score,
        }
    }

    /// Numeric class id, 1 for spam
    pub fn label(&self) -> u8 {
        self.prediction.as_int()
    }

    /// CSV row matching `CSV_HEADER`
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{:.2},{}",
            self.id,
            self.timestamp,
            self.prediction,
            self.confidence_percentage,
            self.label()
        )
    }
}

impl Serialize for PredictionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PredictionRecord", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("email_text", &self.email_text)?;
        state.serialize_field("prediction", &self.prediction)?;
        state.serialize_field("label", &self.label())?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("confidence_percentage", &self.confidence_percentage)?;
        state.serialize_field("raw_score", &self.raw_score)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PredictionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            id: String,
            timestamp: String,
            email_text: String,
            prediction: Label,
            label: Option<u8>,
            confidence: f64,
            confidence_percentage: f64,
            raw_score: f64,
        }

        let wire = Wire::deserialize(deserializer)?;
        wire.prediction.check_int::<D::Error>(wire.label)?;

        Ok(Self {
            id: wire.id,
            timestamp: wire.timestamp,
            email_text: wire.email_text,
            prediction: wire.prediction,
            confidence: wire.confidence,
            confidence_percentage: wire.confidence_percentage,
            raw_score: wire.raw_score,
        })
    }
}

/// Aggregate summary kept alongside the records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreMetadata {
    pub created_at: String,
    pub last_updated: String,
    pub version: String,
    pub total_predictions: usize,
    pub total_spam: usize,
    pub total_ham: usize,
    pub average_confidence: f64,
}

impl StoreMetadata {
    /// Metadata of a freshly created store
    pub fn fresh(now: &str) -> Self {
        Self {
            created_at: now.to_string(),
            last_updated: now.to_string(),
            version: STORE_VERSION.to_string(),
            ..Self::default()
        }
    }
}

/// On-disk store document
///
/// `Default` is the empty view used when the file cannot be parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub metadata: StoreMetadata,
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
}

impl StoreDocument {
    /// Empty store created at `now`
    pub fn empty(now: &str) -> Self {
        Self {
            metadata: StoreMetadata::fresh(now),
            predictions: Vec::new(),
        }
    }

    /// Recompute every aggregate from the full record log
    pub fn refresh_metadata(&mut self, now: &str) {
        let metadata = &mut self.metadata;

        if metadata.created_at.is_empty() {
            metadata.created_at = now.to_string();
        }
        if metadata.version.is_empty() {
            metadata.version = STORE_VERSION.to_string();
        }
        metadata.last_updated = now.to_string();

        metadata.total_predictions = self.predictions.len();
        metadata.total_spam = self
            .predictions
            .iter()
            .filter(|p| p.prediction == Label::Spam)
            .count();
        metadata.total_ham = self
            .predictions
            .iter()
            .filter(|p| p.prediction == Label::Ham)
            .count();

        metadata.average_confidence = if self.predictions.is_empty() {
            0.0
        } else {
            let sum: f64 = self.predictions.iter().map(|p| p.confidence_percentage).sum();
            round2(sum / self.predictions.len() as f64)
        };
    }
}

/// Dashboard statistics over all records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_predictions: usize,
    pub spam_count: usize,
    pub ham_count: usize,
    pub spam_percentage: f64,
    pub ham_percentage: f64,
    pub average_confidence: f64,
    pub max_confidence: f64,
    pub min_confidence: f64,
}

impl PredictionStats {
    /// Compute statistics; all zero for an empty log
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let total = records.len();
        let spam_count = records.iter().filter(|p| p.prediction.is_spam()).count();
        let ham_count = total - spam_count;

        let confidences = records.iter().map(|p| p.confidence_percentage);
        let sum: f64 = confidences.clone().sum();
        let max = confidences.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = confidences.fold(f64::INFINITY, f64::min);

        Self {
            total_predictions: total,
            spam_count,
            ham_count,
            spam_percentage: round2(spam_count as f64 / total as f64 * 100.0),
            ham_percentage: round2(ham_count as f64 / total as f64 * 100.0),
            average_confidence: round2(sum / total as f64),
            max_confidence: round2(max),
            min_confidence: round2(min),
        }
    }
}

/// JSON export payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionExport {
    pub predictions: Vec<PredictionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, label: Label, percentage: f64) -> PredictionRecord {
        PredictionRecord {
            id: format_id(id),
            timestamp: "2024-05-01T10:00:00.000000Z".to_string(),
            email_text: "text".to_string(),
            prediction: label,
            confidence: percentage / 100.0,
            confidence_percentage: percentage,
            raw_score: 0.0,
        }
    }

    #[test]
    fn test_format_id() {
        assert_eq!(format_id(1), "pred_000001");
        assert_eq!(format_id(123456), "pred_123456");
        assert_eq!(format_id(1234567), "pred_1234567");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(65.0), 65.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(65.125), 65.12);
        assert_eq!(round2(65.375), 65.38);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(-2.5), -2.5);
    }

    #[test]
    fn test_average_confidence_tie_rounds_to_even() {
        let records = vec![record(1, Label::Spam, 90.0), record(2, Label::Ham, 40.25)];
        assert_eq!(PredictionStats::from_records(&records).average_confidence, 65.12);

        let mut doc = StoreDocument::empty("2024-05-01T00:00:00.000000Z");
        doc.predictions = records;
        doc.refresh_metadata("2024-05-02T00:00:00.000000Z");
        assert_eq!(doc.metadata.average_confidence, 65.12);
    }

    #[test]
    fn test_record_label_serialized_from_prediction() {
        let json = serde_json::to_value(record(3, Label::Spam, 70.0)).unwrap();
        assert_eq!(json["prediction"], "Spam");
        assert_eq!(json["label"], 1);

        let back: PredictionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.label(), 1);
    }

    #[test]
    fn test_record_with_mismatched_label_is_rejected() {
        let mut json = serde_json::to_value(record(3, Label::Ham, 70.0)).unwrap();
        json["label"] = 1.into();
        assert!(serde_json::from_value::<PredictionRecord>(json).is_err());
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "2024-05-01T10:00:00.000000Z".len());
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn test_email_text_truncated_by_chars() {
        let long = "é".repeat(250);
        let pending = NewPrediction::new(long, PredictionResult::from_score(1.0, 3.0));
        let record = PredictionRecord::new(format_id(1), timestamp_now(), &pending);
        assert_eq!(record.email_text.chars().count(), EMAIL_TEXT_LIMIT);
    }

    #[test]
    fn test_csv_row_two_decimals() {
        let row = record(7, Label::Spam, 90.0).to_csv_row();
        assert_eq!(row, "pred_000007,2024-05-01T10:00:00.000000Z,Spam,90.00,1");
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(PredictionStats::from_records(&[]), PredictionStats::default());
    }

    #[test]
    fn test_stats_thirds_rounding() {
        let records = vec![
            record(1, Label::Spam, 10.0),
            record(2, Label::Ham, 20.0),
            record(3, Label::Ham, 30.5),
        ];
        let stats = PredictionStats::from_records(&records);
        assert_eq!(stats.spam_percentage, 33.33);
        assert_eq!(stats.ham_percentage, 66.67);
        assert_eq!(stats.average_confidence, 20.17);
        assert_eq!(stats.max_confidence, 30.5);
        assert_eq!(stats.min_confidence, 10.0);
    }

    #[test]
    fn test_refresh_metadata_recomputes() {
        let mut doc = StoreDocument::empty("2024-05-01T00:00:00.000000Z");
        doc.predictions.push(record(1, Label::Spam, 90.0));
        doc.predictions.push(record(2, Label::Ham, 40.0));
        doc.refresh_metadata("2024-05-02T00:00:00.000000Z");

        assert_eq!(doc.metadata.created_at, "2024-05-01T00:00:00.000000Z");
        assert_eq!(doc.metadata.last_updated, "2024-05-02T00:00:00.000000Z");
        assert_eq!(doc.metadata.total_predictions, 2);
        assert_eq!(doc.metadata.total_spam, 1);
        assert_eq!(doc.metadata.total_ham, 1);
        assert_eq!(doc.metadata.average_confidence, 65.0);
    }

    #[test]
    fn test_refresh_fills_missing_metadata() {
        let mut doc = StoreDocument::default();
        doc.refresh_metadata("2024-05-02T00:00:00.000000Z");
        assert_eq!(doc.metadata.created_at, "2024-05-02T00:00:00.000000Z");
        assert_eq!(doc.metadata.version, STORE_VERSION);
        assert_eq!(doc.metadata.average_confidence, 0.0);
    }

    #[test]
    fn test_empty_metadata_object_parses() {
        let doc: StoreDocument =
            serde_json::from_str(r#"{"metadata": {}, "predictions": []}"#).unwrap();
        assert_eq!(doc, StoreDocument::default());
    }
}
