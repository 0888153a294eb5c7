//! HTTP route handlers for Axum.

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::{
    api::types::{HealthResponse, PredictRequest, PredictResponse},
    text,
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Classify a batch of raw texts. Inputs go through the same normalization
/// as the clustering pipeline before they reach the classifier.
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<PredictResponse> {
    if request.texts.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "texts must not be empty".into()));
    }
    let cleaned = text::clean_batch(&request.texts);
    let predictions = state.models.classifier.classify(&cleaned).map_err(|err| {
        warn!(%err, "classification failed");
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;
    let mut labels = Vec::with_capacity(predictions.len());
    let mut probs = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        labels.push(prediction.label);
        probs.push(prediction.probs);
    }
    Ok(Json(PredictResponse { labels, probs }))
}
