//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Kick off the backend load in the background when the server starts
    #[serde(default = "default_true")]
    pub load_on_startup: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            load_on_startup: true,
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,
    /// Base inpainting pipeline, relative to the checkpoint directory
    #[serde(default = "default_base_model")]
    pub base_model: String,
    /// Try-on weights file, relative to the checkpoint directory
    #[serde(default = "default_weights")]
    pub weights: String,
    /// "auto", "cuda" or "cpu"
    #[serde(default = "default_accelerator")]
    pub accelerator: String,
    /// Inference worker hosting the model; no worker means the backend never loads
    #[serde(default)]
    pub worker_endpoint: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_checkpoint_dir() -> String {
    "./ckpts".to_string()
}

fn default_base_model() -> String {
    "stable-diffusion-inpainting".to_string()
}

fn default_weights() -> String {
    "virtual_tryon.pth".to_string()
}

fn default_accelerator() -> String {
    "auto".to_string()
}

fn default_timeout() -> u64 {
    600_000
}

impl ModelConfig {
    pub fn base_model_path(&self) -> PathBuf {
        Path::new(&self.checkpoint_dir).join(&self.base_model)
    }

    pub fn weights_path(&self) -> PathBuf {
        Path::new(&self.checkpoint_dir).join(&self.weights)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            base_model: default_base_model(),
            weights: default_weights(),
            accelerator: default_accelerator(),
            worker_endpoint: None,
            timeout_ms: default_timeout(),
        }
    }
}

/// Sampling defaults and request policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default)]
    pub ref_acceleration: bool,
    #[serde(default = "default_max_steps")]
    pub max_inference_steps: u32,
    /// Abort a generation that runs longer than this
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Surface inference faults instead of compositing a fallback
    #[serde(default)]
    pub strict_inference_errors: bool,
}

fn default_guidance_scale() -> f32 {
    2.5
}

fn default_steps() -> u32 {
    30
}

fn default_seed() -> i64 {
    42
}

fn default_max_steps() -> u32 {
    150
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            guidance_scale: default_guidance_scale(),
            num_inference_steps: default_steps(),
            seed: default_seed(),
            ref_acceleration: false,
            max_inference_steps: default_max_steps(),
            deadline_secs: None,
            strict_inference_errors: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where uploads are staged; defaults to the system temp dir
    #[serde(default)]
    pub temp_dir: Option<String>,
    /// Archive every result here when set
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    90
}

impl StorageConfig {
    pub fn staging_root(&self) -> PathBuf {
        self.temp_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            output_dir: None,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("model.accelerator", "auto")?
            .set_default("inference.guidance_scale", 2.5)?
            .set_default("inference.num_inference_steps", 30)?
            .set_default("inference.seed", 42)?
            // Load from configuration file
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (TRYON__SERVER__PORT=9000)
            .add_source(
                Environment::with_prefix("TRYON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if !["auto", "cuda", "cpu"].contains(&self.model.accelerator.as_str()) {
            return Err(invalid(format!(
                "Invalid accelerator '{}'. Must be 'auto', 'cuda' or 'cpu'",
                self.model.accelerator
            )));
        }

        let inference = &self.inference;
        if !(inference.guidance_scale.is_finite() && inference.guidance_scale > 0.0) {
            return Err(invalid("Default guidance_scale must be positive"));
        }
        if inference.max_inference_steps == 0 {
            return Err(invalid("max_inference_steps must be at least 1"));
        }
        if inference.num_inference_steps == 0
            || inference.num_inference_steps > inference.max_inference_steps
        {
            return Err(invalid(format!(
                "Default num_inference_steps must be in [1, {}]",
                inference.max_inference_steps
            )));
        }
        if inference.deadline_secs == Some(0) {
            return Err(invalid("deadline_secs must be positive when set"));
        }

        if !(1..=100).contains(&self.storage.jpeg_quality) {
            return Err(invalid("jpeg_quality must be in [1, 100]"));
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err(invalid(format!(
                "Invalid log format '{}'. Must be 'json' or 'pretty'",
                self.logging.format
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}
