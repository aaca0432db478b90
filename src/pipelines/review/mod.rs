//! Film review pipeline.
//!
//! Predicts whether a review is `Positive` or `Negative`, how confident the model is, and the
//! rating the reviewer would likely give. One shared DistilBERT encoder feeds both a sentiment
//! classification head and a rating regression head.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use film_review_sentiment::review::{ModelArtifacts, ReviewPipelineBuilder};
//!
//! # #[tokio::main]
//! # async fn main() -> film_review_sentiment::error::Result<()> {
//! let pipeline = ReviewPipelineBuilder::distilbert(ModelArtifacts::default())
//!     .build()
//!     .await?;
//!
//! let output = pipeline.run_validated(
//!     "This is an amazing movie, I really enjoyed it! It had great performances and a compelling storyline.",
//! )?;
//! println!(
//!     "{} (confidence: {:.2}, rating: {:.1})",
//!     output.prediction.sentiment, output.prediction.confidence, output.prediction.rating
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Validation
//!
//! [`ReviewPipeline::run_validated`] rejects text that breaks the
//! [review rules](crate::validation) before spending any inference time.
//! [`ReviewPipeline::run`] scores text as-is.

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::{DistilBertReviewModel, MultitaskDistilBert};
pub use crate::pipelines::stats::PipelineStats;
pub use crate::pipelines::utils::DeviceRequest;
pub use builder::{ModelArtifacts, ReviewPipelineBuilder};
pub use model::{EncodedInput, HeadOutputs, ReviewModel};
pub use pipeline::{Output, Prediction, ReviewPipeline, Sentiment, MAX_SEQUENCE_LENGTH};
