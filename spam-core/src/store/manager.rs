//! Prediction store backed by a single JSON document
//!
//! Every mutation reads the whole document, changes it and writes it back.
//! Mutations are serialized by a per-store mutex and written through a
//! sibling temp file that is renamed into place.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::types::*;
use crate::error::Result;

/// Prediction store
pub struct PredictionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PredictionStore {
    /// Open the store at `path`, creating an empty document if absent
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if !tokio::fs::try_exists(&store.path).await? {
            store.write_document(&StoreDocument::empty(&timestamp_now())).await?;
            info!("Initialized prediction store at {}", store.path.display());
        }

        Ok(store)
    }

    /// Backing file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("predictions"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the document from disk, `None` when the file is missing
    ///
    /// Bytes that are not a valid document (including invalid UTF-8) are
    /// reported and read as the empty view without touching the file.
    async fn load_document(&self) -> Result<Option<StoreDocument>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                error!(
                    "Corrupted prediction store at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(Some(StoreDocument::default()))
            }
        }
    }

    /// Read the document, recreating it empty if the file is missing
    ///
    /// Caller must hold `write_lock`.
    async fn read_locked(&self) -> Result<StoreDocument> {
        if let Some(document) = self.load_document().await? {
            return Ok(document);
        }

        warn!(
            "Prediction store {} missing, recreating",
            self.path.display()
        );
        let document = StoreDocument::empty(&timestamp_now());
        self.write_document(&document).await?;
        Ok(document)
    }

    /// Read the document for a query
    async fn read_document(&self) -> Result<StoreDocument> {
        match self.load_document().await? {
            Some(document) => Ok(document),
            None => {
                let _guard = self.write_lock.lock().await;
                self.read_locked().await
            }
        }
    }

    async fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        let temp = self.temp_path();

        if let Err(e) = tokio::fs::write(&temp, json).await {
            error!("Failed to write prediction store: {}", e);
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            error!("Failed to replace prediction store: {}", e);
            return Err(e.into());
        }

        debug!(
            "Prediction store saved ({} records)",
            document.predictions.len()
        );
        Ok(())
    }

    /// Store a prediction, assigning its id and timestamp
    pub async fn append(&self, pending: NewPrediction) -> Result<PredictionRecord> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_locked().await?;

        let now = timestamp_now();
        let id = format_id(document.predictions.len() + 1);
        let record = PredictionRecord::new(id, now.clone(), &pending);

        document.predictions.push(record.clone());
        document.refresh_metadata(&now);
        self.write_document(&document).await?;

        info!(
            "Prediction {} added: {} ({:.2}%)",
            record.id, record.prediction, record.confidence_percentage
        );
        Ok(record)
    }

    /// All records in insertion order, or only the last `limit`
    ///
    /// A limit of zero returns everything.
    pub async fn list_all(&self, limit: Option<usize>) -> Result<Vec<PredictionRecord>> {
        let mut predictions = self.read_document().await?.predictions;

        if let Some(limit) = limit.filter(|l| *l > 0) {
            if predictions.len() > limit {
                predictions.drain(..predictions.len() - limit);
            }
        }

        Ok(predictions)
    }

    /// Current aggregate metadata
    pub async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(self.read_document().await?.metadata)
    }

    /// Statistics over all records
    pub async fn statistics(&self) -> Result<PredictionStats> {
        let document = self.read_document().await?;
        Ok(PredictionStats::from_records(&document.predictions))
    }

    /// Irreversibly delete every record and reset metadata
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_document(&StoreDocument::empty(&timestamp_now()))
            .await?;

        warn!("All predictions deleted from {}", self.path.display());
        Ok(())
    }

    /// CSV rendering of all records, empty when there are none
    pub async fn export_csv(&self) -> Result<String> {
        let predictions = self.read_document().await?.predictions;

        if predictions.is_empty() {
            return Ok(String::new());
        }

        let lines: Vec<String> = std::iter::once(CSV_HEADER.to_string())
            .chain(predictions.iter().map(|p| p.to_csv_row()))
            .collect();

        Ok(lines.join("\n"))
    }

    /// JSON export payload of all records
    pub async fn export_json(&self) -> Result<PredictionExport> {
        let predictions = self.read_document().await?.predictions;
        Ok(PredictionExport { predictions })
    }

    /// Records whose timestamp lies in `[start, end]`
    ///
    /// Compares timestamp strings directly, which is chronological only
    /// because timestamps are fixed-width ISO-8601 UTC.
    pub async fn query_by_range(&self, start: &str, end: &str) -> Result<Vec<PredictionRecord>> {
        let predictions = self.read_document().await?.predictions;

        Ok(predictions
            .into_iter()
            .filter(|p| start <= p.timestamp.as_str() && p.timestamp.as_str() <= end)
            .collect())
    }
}
