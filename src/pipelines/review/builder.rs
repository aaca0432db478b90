use std::path::PathBuf;

use super::pipeline::{ReviewPipeline, MAX_SEQUENCE_LENGTH};
use crate::error::{PipelineError, Result};
use crate::loaders::{load_tokenizer, load_weights, EncoderConfigLoader, EncoderConfigSource};
use crate::models::DistilBertReviewModel;
use crate::pipelines::utils::{impl_device_methods, DeviceRequest};

/// Filesystem locations of the fine-tuned model.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    /// Fine-tuned weights (`.safetensors`, or a PyTorch `.pth`/`.bin` state dict).
    pub weights: PathBuf,
    /// Directory holding `tokenizer.json` or `vocab.txt`.
    pub tokenizer_dir: PathBuf,
    /// Encoder architecture config.
    pub encoder_config: EncoderConfigSource,
}

impl Default for ModelArtifacts {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("film_review_distilbert.pth"),
            tokenizer_dir: PathBuf::from("model/tokenizer"),
            encoder_config: EncoderConfigSource::default(),
        }
    }
}

/// Builds a [`ReviewPipeline`] backed by the multitask DistilBERT.
///
/// Every failure here is a startup fault: the caller should not serve without a pipeline.
pub struct ReviewPipelineBuilder {
    artifacts: ModelArtifacts,
    device_request: DeviceRequest,
    max_length: usize,
}

impl ReviewPipelineBuilder {
    pub fn distilbert(artifacts: ModelArtifacts) -> Self {
        Self {
            artifacts,
            device_request: DeviceRequest::default(),
            max_length: MAX_SEQUENCE_LENGTH,
        }
    }

    /// Maximum number of tokens per review (default 256).
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub async fn build(self) -> Result<ReviewPipeline<DistilBertReviewModel>> {
        let device = self.device_request.resolve()?;
        tracing::info!(device = ?device.location(), "loading film review model");

        let encoder = EncoderConfigLoader::new(self.artifacts.encoder_config.clone())
            .load()
            .await?;
        let tokenizer = load_tokenizer(&self.artifacts.tokenizer_dir)?;

        if let Some(vocab_size) = encoder.vocab_size {
            let tokenizer_vocab = tokenizer.get_vocab_size(true);
            if tokenizer_vocab > vocab_size {
                return Err(PipelineError::ModelLoad(format!(
                    "Tokenizer vocabulary ({tokenizer_vocab}) does not fit the encoder ({vocab_size})"
                )));
            }
        }

        let vb = load_weights(&self.artifacts.weights, &device)?;
        let model = DistilBertReviewModel::new(vb, &encoder, device)?;

        tracing::info!(
            weights = %self.artifacts.weights.display(),
            hidden_size = encoder.hidden_size,
            max_length = self.max_length,
            "film review model ready"
        );

        ReviewPipeline::new(model, tokenizer, self.max_length)
    }
}

impl_device_methods!(ReviewPipelineBuilder);
