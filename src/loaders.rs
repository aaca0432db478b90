//! Loading of the model artifacts: encoder config, tokenizer and fine-tuned weights.
//!
//! - [`HfLoader`] - Hugging Face Hub file download with retry logic
//! - [`EncoderConfigLoader`] - DistilBERT `config.json` from disk or from the hub
//! - [`load_tokenizer`] - `tokenizer.json`, or a WordPiece tokenizer built from `vocab.txt`
//! - [`load_weights`] - safetensors or PyTorch checkpoint into a [`VarBuilder`]
//!
//! Everything here runs once at startup. Any error is a startup fault.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::distilbert::Config;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::Tokenizer;
use tokio::time::Duration;

use crate::error::{PipelineError, Result};

/// Base checkpoint the multitask model was fine-tuned from.
pub const DEFAULT_ENCODER_REPO: &str = "distilbert-base-uncased";

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> Result<PathBuf> {
        let hf_api = hf_hub::api::tokio::ApiBuilder::new()
            .with_chunk_size(None)
            .build()
            .map_err(|e| {
                PipelineError::Download(format!("Failed to initialize HuggingFace API: {e}"))
            })?;
        let hf_api = hf_api.model(self.repo.clone());

        let max_retries = 3;
        let mut attempts = 0u32;

        for attempt in 0..max_retries {
            match hf_api.get(self.filename.as_str()).await {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let error_msg = e.to_string();
                    attempts = attempt + 1;
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries - 1 {
                        let wait_time = Duration::from_millis(100 * (1 << attempt));
                        tracing::warn!(
                            repo = %self.repo,
                            file = %self.filename,
                            attempt = attempts,
                            "hub cache locked, retrying"
                        );
                        tokio::time::sleep(wait_time).await;
                        continue;
                    }
                    return Err(PipelineError::Download(format!(
                        "Failed to download '{}' from '{}': {}",
                        self.filename, self.repo, error_msg
                    )));
                }
            }
        }

        Err(PipelineError::Download(format!(
            "Download timed out for '{}' from '{}' after {} attempt(s)",
            self.filename, self.repo, attempts
        )))
    }
}

/// Where the encoder's `config.json` comes from.
#[derive(Debug, Clone)]
pub enum EncoderConfigSource {
    /// A `config.json` on disk.
    Local(PathBuf),
    /// `config.json` of a Hugging Face Hub repository.
    Hub(String),
}

impl Default for EncoderConfigSource {
    fn default() -> Self {
        EncoderConfigSource::Hub(DEFAULT_ENCODER_REPO.to_string())
    }
}

/// DistilBERT config plus the sizes the rest of the model is checked against.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub config: Config,
    /// Width of the hidden states, which sizes the output heads.
    pub hidden_size: usize,
    /// Number of token embeddings, when the config states it.
    pub vocab_size: Option<usize>,
}

impl EncoderConfig {
    /// Parse a DistilBERT `config.json` document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).map_err(|e| {
            PipelineError::ModelLoad(format!("Invalid DistilBERT config: {e}"))
        })?;

        // `Config` keeps its fields private, so the sizes are read from the raw document.
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let hidden_size = raw
            .get("dim")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .ok_or_else(|| {
                PipelineError::ModelLoad("DistilBERT config has no integer `dim`".into())
            })?;
        let vocab_size = raw
            .get("vocab_size")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize);

        Ok(Self {
            config,
            hidden_size,
            vocab_size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EncoderConfigLoader {
    pub source: EncoderConfigSource,
}

impl EncoderConfigLoader {
    pub fn new(source: EncoderConfigSource) -> Self {
        Self { source }
    }

    pub async fn load(&self) -> Result<EncoderConfig> {
        let path = match &self.source {
            EncoderConfigSource::Local(path) => path.clone(),
            EncoderConfigSource::Hub(repo) => HfLoader::new(repo, "config.json").load().await?,
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            PipelineError::ModelLoad(format!(
                "Failed to read encoder config '{}': {e}",
                path.display()
            ))
        })?;

        EncoderConfig::from_json(&content)
    }
}

/// Load the tokenizer stored in `dir`.
///
/// Prefers `tokenizer.json`. Falls back to building an uncased BERT WordPiece tokenizer from
/// `vocab.txt`, which is what a saved `DistilBertTokenizer` directory contains.
pub fn load_tokenizer(dir: &Path) -> Result<Tokenizer> {
    let tokenizer_json = dir.join("tokenizer.json");
    if tokenizer_json.exists() {
        tracing::debug!(path = %tokenizer_json.display(), "loading tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json).map_err(|e| {
            PipelineError::ModelLoad(format!(
                "Failed to load tokenizer '{}': {e}",
                tokenizer_json.display()
            ))
        });
    }

    let vocab = dir.join("vocab.txt");
    if vocab.exists() {
        tracing::debug!(path = %vocab.display(), "building WordPiece tokenizer from vocab.txt");
        return wordpiece_from_vocab(&vocab);
    }

    Err(PipelineError::ModelLoad(format!(
        "No tokenizer found in '{}' (tried tokenizer.json, vocab.txt)",
        dir.display()
    )))
}

fn wordpiece_from_vocab(vocab: &Path) -> Result<Tokenizer> {
    let wordpiece = WordPiece::from_file(&vocab.to_string_lossy())
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| {
            PipelineError::ModelLoad(format!(
                "Failed to build WordPiece model from '{}': {e}",
                vocab.display()
            ))
        })?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

    let special = |token: &str| {
        tokenizer.token_to_id(token).ok_or_else(|| {
            PipelineError::ModelLoad(format!(
                "Vocabulary '{}' has no {token} token",
                vocab.display()
            ))
        })
    };
    let sep = ("[SEP]".to_string(), special("[SEP]")?);
    let cls = ("[CLS]".to_string(), special("[CLS]")?);
    tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

    Ok(tokenizer)
}

/// Open the fine-tuned checkpoint at `path` as F32 weights on `device`.
///
/// `.safetensors` files are memory-mapped; anything else is read as a PyTorch state dict.
pub fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    if !path.is_file() {
        return Err(PipelineError::ModelLoad(format!(
            "Model weights not found at '{}'",
            path.display()
        )));
    }

    let vb = if path.extension().is_some_and(|e| e == "safetensors") {
        // SAFETY: the file is opened read-only and is not modified while the process runs.
        unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device) }
    } else {
        VarBuilder::from_pth(path, DType::F32, device)
    }
    .map_err(|e| {
        PipelineError::ModelLoad(format!(
            "Failed to read model weights '{}': {e}",
            path.display()
        ))
    })?;

    Ok(vb)
}
