//! Shared application state for the Axum server.

use std::sync::Arc;

use axum::http::HeaderValue;

use super::config::ServerConfig;
use crate::error::{PipelineError, Result};
use crate::review::{ReviewModel, ReviewPipeline};

/// The engine as shared by every handler.
pub type SharedPipeline = Arc<ReviewPipeline<Box<dyn ReviewModel>>>;

/// Passed to all route handlers via Axum `State`.
///
/// The pipeline is read-only after startup, so handlers share it without locks.
pub struct AppState {
    pub pipeline: SharedPipeline,
    /// Serve the validated front-end on `/predict`.
    pub validate_input: bool,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppState {
    /// Wrap an already built pipeline with the server settings from `config`.
    ///
    /// # Errors
    /// - `PipelineError::Config` if an origin is not a valid header value
    pub fn new(
        pipeline: ReviewPipeline<Box<dyn ReviewModel>>,
        config: &ServerConfig,
    ) -> Result<Arc<Self>> {
        let allowed_origins = config
            .allowed_origins()
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(&origin).map_err(|e| {
                    PipelineError::Config(format!("Invalid CORS origin '{origin}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(Self {
            pipeline: Arc::new(pipeline),
            validate_input: config.validate_input,
            allowed_origins,
        }))
    }
}
