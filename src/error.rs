//! Error types for this crate.
//!
//! All fallible pipeline operations return [`Result<T>`] which uses [`PipelineError`] as the
//! error type. Rejected review text is reported separately as a
//! [`ValidationError`](crate::validation::ValidationError), which is wrapped here only when the
//! validated front-end is used.

use thiserror::Error;

use crate::validation::ValidationError;

/// A [`Result`](std::result::Result) alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust
/// use film_review_sentiment::error::PipelineError;
///
/// fn handle_error(e: PipelineError) {
///     match &e {
///         PipelineError::InvalidReview(reason) => {
///             // Caller's fault - resubmit corrected text
///             eprintln!("rejected: {reason}");
///         }
///         PipelineError::ModelLoad(_) | PipelineError::Download(_) => {
///             // Startup fault - do not serve
///         }
///         PipelineError::Unexpected(_) => {
///             // Internal error - fail the request
///             eprintln!("Internal error: {e}");
///         }
///         _ => {}
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Network or download failure while fetching hub files. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Weights, encoder config or tokenizer assets are missing or incompatible.
    #[error("{0}")]
    ModelLoad(String),

    /// Tokenization failure.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// Invalid runtime configuration.
    #[error("{0}")]
    Config(String),

    /// Review text rejected by the validator.
    #[error(transparent)]
    InvalidReview(#[from] ValidationError),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl From<hf_hub::api::tokio::ApiError> for PipelineError {
    fn from(value: hf_hub::api::tokio::ApiError) -> Self {
        PipelineError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for PipelineError {
    fn from(value: candle_core::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Unexpected(value.to_string())
    }
}
