use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::models::ErrorResponse;
use crate::error::PipelineError;
use crate::validation::ValidationError;

/// Message returned for every failure that is not the client's fault.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Errors a route handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// The review broke a rule; answered with 422 and the rule's message.
    InvalidReview(ValidationError),
    /// The body was not a `{"text": string}` JSON document.
    BadRequest { status: StatusCode, detail: String },
    /// Anything else; details are logged, the client only sees a generic message.
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidReview(e) => ApiError::InvalidReview(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Inference task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidReview(e) => {
                tracing::debug!(reason = %e, "review rejected");
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::BadRequest { status, detail } => {
                tracing::debug!(%status, reason = %detail, "request body rejected");
                (status, detail)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_DETAIL.to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_422() {
        let err: ApiError = PipelineError::from(ValidationError::EmptyInput).into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn rejected_bodies_keep_their_status() {
        let err = ApiError::BadRequest {
            status: StatusCode::BAD_REQUEST,
            detail: "Failed to parse the request body as JSON".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_map_to_500() {
        for err in [
            PipelineError::Unexpected("bad head".into()),
            PipelineError::Tokenization("bad input".into()),
            PipelineError::Device("gone".into()),
        ] {
            let err: ApiError = err.into();
            assert_eq!(
                err.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}
