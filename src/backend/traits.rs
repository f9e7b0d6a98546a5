//! Common traits and types for the generative try-on backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::backend::device::DeviceSelection;
use crate::error::Result;
use crate::imaging::ImageAsset;

/// Sampling parameters forwarded to the backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Guidance scale / CFG scale
    pub guidance_scale: f32,

    /// Number of denoising steps
    pub num_inference_steps: u32,

    /// Random seed for reproducibility
    pub seed: i64,

    /// Reuse reference-image features across steps
    pub ref_acceleration: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            guidance_scale: 2.5,
            num_inference_steps: 30,
            seed: 42,
            ref_acceleration: false,
        }
    }
}

/// One generation request, keyed by input role. Every image is canonical-resolution.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInputs<'a> {
    /// Person to dress
    pub src_image: &'a ImageAsset,

    /// Garment to transfer
    pub ref_image: &'a ImageAsset,

    /// Region eligible for modification
    pub mask: &'a ImageAsset,

    /// Dense pose conditioning
    pub densepose: &'a ImageAsset,
}

/// Images returned by a generation call
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub generated_image: Vec<ImageAsset>,
}

/// Generative try-on model
#[async_trait]
pub trait TryOnModel: Send + Sync {
    /// Model name, for logs
    fn name(&self) -> &str;

    /// Run one generation
    async fn generate(
        &self,
        inputs: GenerationInputs<'_>,
        params: &SamplingParams,
    ) -> Result<GenerationOutput>;
}

/// A model that finished loading, with the device it runs on
#[derive(Clone)]
pub struct LoadedBackend {
    pub model: Arc<dyn TryOnModel>,
    pub device: DeviceSelection,
}

/// Heavyweight acquisition of the generative model
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<LoadedBackend>;
}

/// Outcome of asking for the backend
#[derive(Clone)]
pub enum Readiness {
    Ready(Arc<dyn TryOnModel>),
    Unavailable(String),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Ready(model) => f.debug_tuple("Ready").field(&model.name()).finish(),
            Readiness::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Access to the process-wide backend, as seen by the request path
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Load the backend if no attempt has been made yet, otherwise return the cached outcome
    async fn ensure_loaded(&self) -> Readiness;

    /// Whether a load has succeeded. Never triggers a load.
    fn is_ready(&self) -> bool;

    /// Whether a load attempt has finished, successfully or not
    fn load_attempted(&self) -> bool;
}
