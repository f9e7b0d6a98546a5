//! Configuration module

pub mod settings;

pub use settings::{
    InferenceConfig, LoggingConfig, ModelConfig, ServerConfig, Settings, StorageConfig,
};
