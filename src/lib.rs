//! # Film review sentiment
//!
//! Sentiment and rating predictions for film reviews with a multitask DistilBERT, in Rust on
//! candle. One encoder feeds a two-way sentiment head and a rating regression head.
//!
//! - [`review`] - the inference pipeline and its builder
//! - [`validation`] - the rules a review must satisfy before it is scored
//! - [`loaders`] - encoder config, tokenizer and weight loading
//! - [`server`] - the axum HTTP front-end

pub mod error;
pub mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;
pub mod server;
pub mod validation;

pub use error::{PipelineError, Result};
pub use pipelines::review;
pub use validation::{validate_review, ReviewRules, ValidationError};
