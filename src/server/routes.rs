//! Axum route handlers for the HTTP API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::error::ApiError;
use super::models::{HealthResponse, ReviewRequest};
use super::state::AppState;
use crate::review::Prediction;

/// `GET /health`
///
/// ```json
/// {"status": "healthy"}
/// ```
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// `POST /predict` with review validation.
///
/// # Errors
///
/// - 400/415/422: the body is not `{"text": string}`, `detail` says why
/// - 422: the review broke a rule, `detail` names it
/// - 500: inference failed
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(request) = payload?;
    score(&state, request.text, true).await
}

/// `POST /predict` without validation. Any text is scored as-is.
pub async fn predict_unvalidated(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(request) = payload?;
    score(&state, request.text, false).await
}

async fn score(state: &AppState, text: String, validate: bool) -> Result<Json<Prediction>, ApiError> {
    let pipeline = Arc::clone(&state.pipeline);

    // Tensor work is CPU bound and must not stall the async workers.
    let output = tokio::task::spawn_blocking(move || {
        if validate {
            pipeline.run_validated(&text)
        } else {
            pipeline.run(&text)
        }
    })
    .await??;

    tracing::debug!(
        sentiment = %output.prediction.sentiment,
        confidence = output.prediction.confidence,
        rating = output.prediction.rating,
        tokens = output.stats.tokens,
        elapsed_ms = output.stats.total_ms(),
        "prediction served"
    );

    Ok(Json(output.prediction))
}
