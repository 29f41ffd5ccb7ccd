//! API request handlers

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use spam_core::store::{NewPrediction, PredictionRecord, PredictionStats, PredictionStore, StoreMetadata};
use spam_core::{Label, PredictionResult, Predictor};

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state
///
/// Each component holds either the ready value or the reason it failed to
/// initialize; a failed component stays unavailable until restart.
pub struct AppState {
    pub predictor: Result<Arc<Predictor>, String>,
    pub store: Result<Arc<PredictionStore>, String>,
    pub max_text_length: usize,
    pub max_batch_size: usize,
}

impl AppState {
    /// Load the model and open the store, logging each outcome once
    pub async fn initialize(config: &ServiceConfig) -> Self {
        let predictor = match config.model.load_predictor() {
            Ok(predictor) => {
                info!("Spam detector initialized successfully");
                Ok(Arc::new(predictor))
            }
            Err(e) => {
                error!("Failed to initialize spam detector: {}", e);
                Err(e.to_string())
            }
        };

        let store = match PredictionStore::open(&config.storage.database_path).await {
            Ok(store) => {
                info!(
                    "Prediction database initialized at {}",
                    store.path().display()
                );
                Ok(Arc::new(store))
            }
            Err(e) => {
                error!("Failed to initialize prediction database: {}", e);
                Err(e.to_string())
            }
        };

        Self {
            predictor,
            store,
            max_text_length: config.server.max_text_length,
            max_batch_size: config.server.max_batch_size,
        }
    }

    pub fn predictor(&self) -> ApiResult<&Predictor> {
        self.predictor
            .as_deref()
            .map_err(|_| ApiError::ServiceUnavailable("Model not initialized".to_string()))
    }

    pub fn store(&self) -> ApiResult<&PredictionStore> {
        self.store
            .as_deref()
            .map_err(|_| ApiError::ServiceUnavailable("Database not initialized".to_string()))
    }

    /// Both components, as needed by the prediction routes
    fn services(&self) -> ApiResult<(&Predictor, &PredictionStore)> {
        match (self.predictor.as_deref(), self.store.as_deref()) {
            (Ok(predictor), Ok(store)) => Ok((predictor, store)),
            _ => Err(ApiError::ServiceUnavailable(
                "Services not initialized".to_string(),
            )),
        }
    }

    /// Reject blank or oversized email text
    fn validate_text(&self, text: &str) -> Result<(), String> {
        if text.trim().is_empty() {
            return Err("Email text cannot be empty".to_string());
        }
        if text.chars().count() > self.max_text_length {
            return Err(format!(
                "Email text exceeds {} characters",
                self.max_text_length
            ));
        }
        Ok(())
    }
}

/// Single prediction request
#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub text: String,
}

/// Batch prediction request
#[derive(Debug, Deserialize)]
pub struct BatchEmailInput {
    pub emails: Vec<String>,
}

/// One entry of a batch response
#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Prediction or per-item error
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Prediction(PredictionResult),
    Error { error: String },
}

/// Batch prediction response
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub spam_count: usize,
    pub ham_count: usize,
    pub error_count: usize,
    pub results: Vec<BatchItem>,
}

/// Query for GET /predictions
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// Query for GET /predictions/range
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: String,
    pub end: String,
}

/// Record listing
#[derive(Debug, Serialize)]
pub struct PredictionList {
    pub total: usize,
    pub predictions: Vec<PredictionRecord>,
}

impl From<Vec<PredictionRecord>> for PredictionList {
    fn from(predictions: Vec<PredictionRecord>) -> Self {
        Self {
            total: predictions.len(),
            predictions,
        }
    }
}

/// Statistics response
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub statistics: PredictionStats,
    pub metadata: StoreMetadata,
}

/// GET / - Service description
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Spam Email Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /predict": "Classify a single email and save",
            "POST /predict-batch": "Classify multiple emails",
            "GET /model-info": "Get model performance metrics",
            "GET /predictions": "Get all saved predictions",
            "GET /predictions/range": "Get predictions between two timestamps",
            "GET /statistics": "Get aggregate statistics",
            "GET /export/csv": "Download predictions as CSV",
            "GET /export/json": "Download predictions as JSON",
            "DELETE /predictions": "Clear all predictions",
            "GET /health": "Health check"
        }
    }))
}

/// GET /health - Component status
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.predictor.is_ok();
    let database_ready = state.store.is_ok();

    if model_loaded && database_ready {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "model_loaded": true,
                "database_ready": true
            })),
        );
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "degraded",
            "model_loaded": model_loaded,
            "database_ready": database_ready,
            "error": "Services not initialized",
            "status_code": StatusCode::SERVICE_UNAVAILABLE.as_u16()
        })),
    )
}

/// POST /predict - Classify one email and store the result
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(input): Json<EmailInput>,
) -> ApiResult<Json<PredictionResult>> {
    let (predictor, store) = state.services()?;
    state.validate_text(&input.text).map_err(ApiError::bad_request)?;

    let result = predictor.predict(&input.text);

    store
        .append(NewPrediction::new(input.text, result.clone()))
        .await
        .map_err(|e| ApiError::internal("Prediction failed", e))?;

    info!(
        "Prediction made: {} (confidence: {:.2}%)",
        result.prediction, result.confidence_percentage
    );

    Ok(Json(result))
}

/// POST /predict-batch - Classify up to `max_batch_size` emails
///
/// Invalid items are reported per index and do not abort the batch.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<BatchEmailInput>,
) -> ApiResult<Json<BatchResponse>> {
    let (predictor, store) = state.services()?;

    if batch.emails.is_empty() || batch.emails.len() > state.max_batch_size {
        return Err(ApiError::bad_request(format!(
            "Batch must contain between 1 and {} emails",
            state.max_batch_size
        )));
    }

    let mut results = Vec::with_capacity(batch.emails.len());
    let mut spam_count = 0;
    let mut ham_count = 0;

    for (index, text) in batch.emails.into_iter().enumerate() {
        if let Err(msg) = state.validate_text(&text) {
            let error = if text.trim().is_empty() {
                "Empty email text".to_string()
            } else {
                msg
            };
            results.push(BatchItem {
                index,
                outcome: BatchOutcome::Error { error },
            });
            continue;
        }

        let result = predictor.predict(&text);
        store
            .append(NewPrediction::new(text, result.clone()))
            .await
            .map_err(|e| ApiError::internal("Batch prediction failed", e))?;

        match result.prediction {
            Label::Spam => spam_count += 1,
            Label::Ham => ham_count += 1,
        }
        results.push(BatchItem {
            index,
            outcome: BatchOutcome::Prediction(result),
        });
    }

    let total = results.len();
    info!(
        "Batch classified: {} emails, {} spam, {} ham",
        total, spam_count, ham_count
    );

    Ok(Json(BatchResponse {
        total,
        spam_count,
        ham_count,
        error_count: total - spam_count - ham_count,
        results,
    }))
}

/// GET /model-info - Evaluation snapshot of the loaded model
pub async fn model_info(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let predictor = state.predictor()?;
    Ok(Json(predictor.model_info().clone()))
}

/// GET /predictions - Stored predictions, optionally only the last `limit`
pub async fn list_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PredictionList>> {
    let predictions = state
        .store()?
        .list_all(params.limit)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve predictions", e))?;

    Ok(Json(predictions.into()))
}

/// GET /predictions/range - Predictions with `start <= timestamp <= end`
pub async fn predictions_in_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<PredictionList>> {
    let predictions = state
        .store()?
        .query_by_range(&params.start, &params.end)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve predictions", e))?;

    Ok(Json(predictions.into()))
}

/// GET /statistics - Aggregate statistics and store metadata
pub async fn statistics(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatisticsResponse>> {
    let store = state.store()?;

    let statistics = store
        .statistics()
        .await
        .map_err(|e| ApiError::internal("Failed to get statistics", e))?;
    let metadata = store
        .metadata()
        .await
        .map_err(|e| ApiError::internal("Failed to get statistics", e))?;

    Ok(Json(StatisticsResponse {
        statistics,
        metadata,
    }))
}

/// GET /export/csv - Download all predictions as CSV
pub async fn export_csv(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let csv = state
        .store()?
        .export_csv()
        .await
        .map_err(|e| ApiError::internal("Failed to export CSV", e))?;

    if csv.is_empty() {
        return Err(ApiError::bad_request("No predictions to export"));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=predictions.csv",
            ),
        ],
        csv,
    ))
}

/// GET /export/json - Download all predictions as JSON
pub async fn export_json(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let export = state
        .store()?
        .export_json()
        .await
        .map_err(|e| ApiError::internal("Failed to export JSON", e))?;

    if export.predictions.is_empty() {
        return Err(ApiError::bad_request("No predictions to export"));
    }

    let body = serde_json::to_string_pretty(&export)
        .map_err(|e| ApiError::internal("Failed to export JSON", e))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=predictions.json",
            ),
        ],
        body,
    ))
}

/// DELETE /predictions - Irreversibly clear every stored prediction
pub async fn clear_predictions(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    state
        .store()?
        .clear_all()
        .await
        .map_err(|e| ApiError::internal("Failed to clear predictions", e))?;

    warn!("All predictions cleared by user");

    Ok(Json(json!({
        "message": "All predictions have been cleared",
        "status": "success"
    })))
}
