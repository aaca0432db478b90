use candle_core::{DType, D};
use candle_nn::ops::softmax;
use serde::{Deserialize, Serialize};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::model::{EncodedInput, HeadOutputs, ReviewModel};
use crate::error::{PipelineError, Result};
use crate::pipelines::stats::PipelineStats;
use crate::validation::ReviewRules;

/// Maximum number of tokens (special tokens included) fed to the encoder.
pub const MAX_SEQUENCE_LENGTH: usize = 256;

// ============ Output types ============

/// Predicted polarity of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        };
        write!(f, "{name}")
    }
}

/// Sentiment label, its probability and the regressed rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// `Positive` when P(positive) > 0.5.
    pub sentiment: Sentiment,
    /// Probability of the predicted label, in [0.5, 1.0].
    pub confidence: f32,
    /// Rating head output, unclamped.
    pub rating: f32,
}

/// Output of a single `run()`.
#[derive(Debug, Clone)]
pub struct Output {
    /// The prediction.
    pub prediction: Prediction,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Pipeline ============

/// Predicts sentiment and rating for film reviews.
///
/// Construct with [`ReviewPipelineBuilder`](super::ReviewPipelineBuilder), or with
/// [`ReviewPipeline::new`] around any [`ReviewModel`].
///
/// Two front-ends share the same inference path: [`run`](Self::run) takes text as-is,
/// [`run_validated`](Self::run_validated) applies the review rules first.
///
/// # Examples
///
/// ```rust,no_run
/// # use film_review_sentiment::review::{ModelArtifacts, ReviewPipelineBuilder};
/// # #[tokio::main]
/// # async fn main() -> film_review_sentiment::error::Result<()> {
/// let pipeline = ReviewPipelineBuilder::distilbert(ModelArtifacts::default())
///     .cpu()
///     .build()
///     .await?;
///
/// let output = pipeline.run_validated(
///     "A slow start, but the last hour is gripping and the cast is superb throughout.",
/// )?;
/// println!(
///     "{} ({:.2}), rating {:.1}",
///     output.prediction.sentiment, output.prediction.confidence, output.prediction.rating
/// );
/// # Ok(())
/// # }
/// ```
pub struct ReviewPipeline<M: ReviewModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) rules: ReviewRules,
}

impl<M: ReviewModel> ReviewPipeline<M> {
    /// Wrap `model` and `tokenizer`, truncating encodings to `max_length` tokens.
    pub fn new(model: M, mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                PipelineError::Tokenization(format!("Failed to configure truncation: {e}"))
            })?;

        let (pad_id, pad_token) = match tokenizer.get_padding() {
            Some(p) => (p.pad_id, p.pad_token.clone()),
            None => (
                tokenizer.token_to_id("[PAD]").unwrap_or(0),
                "[PAD]".to_string(),
            ),
        };
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(Self {
            model,
            tokenizer,
            rules: ReviewRules::default(),
        })
    }

    /// Replace the rules used by [`run_validated`](Self::run_validated).
    pub fn with_rules(mut self, rules: ReviewRules) -> Self {
        self.rules = rules;
        self
    }

    /// The rules used by [`run_validated`](Self::run_validated).
    pub fn rules(&self) -> &ReviewRules {
        &self.rules
    }

    /// Tokenize `text` into ids and attention mask.
    pub fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::Tokenization(format!("Tokenization error: {e}")))?;

        let encoded = EncodedInput {
            ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        };
        if encoded.is_empty() {
            return Err(PipelineError::Unexpected(
                "Tokenizer produced an empty encoding".into(),
            ));
        }

        Ok(encoded)
    }

    /// Predict sentiment and rating for `text` without validating it.
    pub fn run(&self, text: &str) -> Result<Output> {
        let stats_builder = PipelineStats::start();

        let encoded = self.encode(text)?;
        let heads = self.model.forward(&encoded)?;
        let prediction = prediction_from_heads(&heads)?;

        let stats = stats_builder.finish(encoded.real_tokens());
        tracing::debug!(
            sentiment = %prediction.sentiment,
            confidence = prediction.confidence,
            rating = prediction.rating,
            tokens = stats.tokens,
            elapsed_ms = stats.total_ms(),
            "review scored"
        );

        Ok(Output { prediction, stats })
    }

    /// Validate `text`, then predict on the trimmed review.
    ///
    /// Rejected text returns [`PipelineError::InvalidReview`] before any inference work.
    pub fn run_validated(&self, text: &str) -> Result<Output> {
        let review = self.rules.validate(text)?;
        self.run(review)
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

impl<M: ReviewModel + 'static> ReviewPipeline<M> {
    /// Erase the model type, e.g. to share the pipeline through non-generic server state.
    pub fn into_dyn(self) -> ReviewPipeline<Box<dyn ReviewModel>> {
        ReviewPipeline {
            model: Box::new(self.model),
            tokenizer: self.tokenizer,
            rules: self.rules,
        }
    }
}

/// Turn raw head outputs into a [`Prediction`].
///
/// Any shape mismatch or non-finite value is an error rather than a made-up prediction.
pub(crate) fn prediction_from_heads(heads: &HeadOutputs) -> Result<Prediction> {
    let logits = heads.sentiment_logits.to_dtype(DType::F32)?;
    let probs = softmax(&logits, D::Minus1)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    let &[negative, positive] = probs.as_slice() else {
        return Err(PipelineError::Unexpected(format!(
            "Sentiment head returned {} values, expected 2",
            probs.len()
        )));
    };
    if !negative.is_finite() || !positive.is_finite() {
        return Err(PipelineError::Unexpected(
            "Sentiment head produced non-finite probabilities".into(),
        ));
    }

    let ratings = heads
        .rating
        .to_dtype(DType::F32)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    let &[rating] = ratings.as_slice() else {
        return Err(PipelineError::Unexpected(format!(
            "Rating head returned {} values, expected 1",
            ratings.len()
        )));
    };
    if !rating.is_finite() {
        return Err(PipelineError::Unexpected(
            "Rating head produced a non-finite value".into(),
        ));
    }

    let (sentiment, confidence) = if positive > 0.5 {
        (Sentiment::Positive, positive)
    } else {
        (Sentiment::Negative, negative)
    };

    Ok(Prediction {
        sentiment,
        confidence,
        rating,
    })
}
