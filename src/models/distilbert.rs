//! Multitask DistilBERT: one shared encoder, a sentiment head and a rating head.
//!
//! Uses `candle_transformers::models::distilbert` for the encoder. Parameter names match the
//! fine-tuned checkpoint: `distilbert.*`, `sentiment_classifier.*`, `rating_regressor.*`.

use candle_core::{Device, IndexOp, Tensor};
use candle_nn::{Dropout, Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config, DistilBertModel};

use crate::error::{PipelineError, Result};
use crate::loaders::EncoderConfig;
use crate::pipelines::review::model::{EncodedInput, HeadOutputs, ReviewModel};

/// Number of sentiment classes (negative, positive).
pub const NUM_LABELS: usize = 2;

const DROPOUT_PROB: f32 = 0.1;

/// The encoder with its two task heads.
pub struct MultitaskDistilBert {
    distilbert: DistilBertModel,
    dropout: Dropout,
    sentiment_classifier: Linear,
    rating_regressor: Linear,
}

impl MultitaskDistilBert {
    pub fn load(vb: VarBuilder, config: &Config, hidden_size: usize) -> Result<Self> {
        let distilbert = DistilBertModel::load(vb.pp("distilbert"), config).map_err(|e| {
            PipelineError::ModelLoad(format!("Failed to load DistilBERT encoder: {e}"))
        })?;
        let sentiment_classifier =
            candle_nn::linear(hidden_size, NUM_LABELS, vb.pp("sentiment_classifier")).map_err(
                |e| PipelineError::ModelLoad(format!("Failed to load sentiment head: {e}")),
            )?;
        let rating_regressor = candle_nn::linear(hidden_size, 1, vb.pp("rating_regressor"))
            .map_err(|e| PipelineError::ModelLoad(format!("Failed to load rating head: {e}")))?;

        Ok(Self {
            distilbert,
            dropout: Dropout::new(DROPOUT_PROB),
            sentiment_classifier,
            rating_regressor,
        })
    }

    /// Returns `(sentiment_logits [batch, 2], rating [batch, 1])`.
    ///
    /// `attention_mask` follows candle's DistilBERT convention: 1 marks a padded position.
    /// Dropout is only applied when `train` is set.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        train: bool,
    ) -> Result<(Tensor, Tensor)> {
        let hidden = self.distilbert.forward(input_ids, attention_mask)?;
        let pooled = hidden.i((.., 0))?;
        let pooled = self.dropout.forward(&pooled, train)?;

        let sentiment_logits = self.sentiment_classifier.forward(&pooled)?;
        let rating = self.rating_regressor.forward(&pooled)?;

        Ok((sentiment_logits, rating))
    }
}

/// Film review model backed by [`MultitaskDistilBert`].
pub struct DistilBertReviewModel {
    model: MultitaskDistilBert,
    device: Device,
}

impl DistilBertReviewModel {
    pub fn new(vb: VarBuilder, encoder: &EncoderConfig, device: Device) -> Result<Self> {
        let model = MultitaskDistilBert::load(vb, &encoder.config, encoder.hidden_size)?;
        Ok(Self { model, device })
    }
}

impl ReviewModel for DistilBertReviewModel {
    fn forward(&self, input: &EncodedInput) -> Result<HeadOutputs> {
        let seq_len = input.len();
        if seq_len == 0 || input.attention_mask.len() != seq_len {
            return Err(PipelineError::Unexpected(format!(
                "Malformed encoding: {} ids, {} mask entries",
                seq_len,
                input.attention_mask.len()
            )));
        }

        let input_ids = Tensor::from_slice(&input.ids, (1, seq_len), &self.device)?;
        // Real tokens attend (0), padding is masked out (1).
        let padding: Vec<u8> = input
            .attention_mask
            .iter()
            .map(|&m| u8::from(m == 0))
            .collect();
        let attention_mask = Tensor::from_vec(padding, (1, seq_len), &self.device)?;

        let (sentiment_logits, rating) = self.model.forward(&input_ids, &attention_mask, false)?;

        Ok(HeadOutputs {
            sentiment_logits,
            rating,
        })
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
