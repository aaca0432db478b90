//! Server configuration, read from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::loaders::EncoderConfigSource;
use crate::pipelines::review::{DeviceRequest, ModelArtifacts};

/// Everything the binary needs to start serving.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Public origin of the frontend, e.g. `http://localhost`.
    pub server_name: String,
    /// Port the frontend is served on.
    pub frontend_port: String,
    /// Model files.
    pub artifacts: ModelArtifacts,
    /// Compute device.
    pub device: DeviceRequest,
    /// Serve the validated front-end on `/predict`.
    pub validate_input: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            server_name: "http://localhost".to_string(),
            frontend_port: "80".to_string(),
            artifacts: ModelArtifacts::default(),
            device: DeviceRequest::default(),
            validate_input: true,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `BACKEND_HOST` | `host` |
    /// | `BACKEND_PORT` | `port` |
    /// | `SERVER_NAME` | `server_name` |
    /// | `FRONTEND_PORT` | `frontend_port` |
    /// | `MODEL_WEIGHTS` | `artifacts.weights` |
    /// | `TOKENIZER_DIR` | `artifacts.tokenizer_dir` |
    /// | `ENCODER_CONFIG` | `artifacts.encoder_config` (local file) |
    /// | `ENCODER_REPO` | `artifacts.encoder_config` (hub repo) |
    /// | `DEVICE` | `device` |
    /// | `VALIDATE_INPUT` | `validate_input` |
    ///
    /// # Errors
    /// - `PipelineError::Config` if a numeric, boolean or device value does not parse
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source. `lookup` returns `None` for unset keys.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BACKEND_HOST") {
            self.host = val;
        }
        if let Some(val) = lookup("BACKEND_PORT") {
            self.port = val
                .trim()
                .parse()
                .map_err(|e| PipelineError::Config(format!("Invalid BACKEND_PORT '{val}': {e}")))?;
        }
        if let Some(val) = lookup("SERVER_NAME") {
            self.server_name = val;
        }
        if let Some(val) = lookup("FRONTEND_PORT") {
            self.frontend_port = val;
        }

        if let Some(val) = lookup("MODEL_WEIGHTS") {
            self.artifacts.weights = PathBuf::from(val);
        }
        if let Some(val) = lookup("TOKENIZER_DIR") {
            self.artifacts.tokenizer_dir = PathBuf::from(val);
        }
        match (lookup("ENCODER_CONFIG"), lookup("ENCODER_REPO")) {
            (Some(path), _) => {
                self.artifacts.encoder_config = EncoderConfigSource::Local(PathBuf::from(path))
            }
            (None, Some(repo)) => self.artifacts.encoder_config = EncoderConfigSource::Hub(repo),
            (None, None) => {}
        }

        if let Some(val) = lookup("DEVICE") {
            self.device = val.parse()?;
        }
        if let Some(val) = lookup("VALIDATE_INPUT") {
            self.validate_input = parse_bool(&val).ok_or_else(|| {
                PipelineError::Config(format!("Invalid VALIDATE_INPUT '{val}'"))
            })?;
        }

        Ok(self)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| PipelineError::Config(format!("Invalid bind address '{addr}': {e}")))
    }

    /// Origins allowed to call the API from a browser.
    pub fn allowed_origins(&self) -> Vec<String> {
        vec![
            self.server_name.clone(),
            format!("{}:{}", self.server_name, self.frontend_port),
        ]
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
