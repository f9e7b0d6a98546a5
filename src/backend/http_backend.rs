//! HTTP client for the inference worker hosting the generative model

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::backend::device::DeviceSelection;
use crate::backend::traits::{
    GenerationInputs, GenerationOutput, LoadedBackend, ModelLoader, SamplingParams, TryOnModel,
};
use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::imaging::codec::{self, ImageFormat};
use crate::imaging::ImageAsset;

/// Try-on model served by a remote inference worker
pub struct RemoteModel {
    name: String,
    client: Client,
    endpoint: String,
}

/// Load request sent to the worker
#[derive(Debug, Serialize)]
struct ApiLoadRequest<'a> {
    base_model: &'a str,
    weights: &'a str,
    device: String,
    dtype: String,
}

#[derive(Debug, Deserialize)]
struct ApiLoadResponse {
    #[serde(default)]
    model: Option<String>,
}

/// Generation request: one base64 PNG per input role plus sampling parameters
#[derive(Debug, Serialize)]
struct ApiTryOnRequest {
    src_image: String,
    ref_image: String,
    mask: String,
    densepose: String,
    guidance_scale: f32,
    num_inference_steps: u32,
    seed: i64,
    ref_acceleration: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTryOnResponse {
    #[serde(default)]
    generated_image: Vec<String>,
}

impl RemoteModel {
    /// Create a client for the worker at `endpoint`
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::Infrastructure(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: "remote-tryon".to_string(),
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the worker to load the checkpoint onto the selected device
    async fn load_remote(
        &mut self,
        base_model: &str,
        weights: &str,
        device: DeviceSelection,
    ) -> Result<()> {
        let url = format!("{}/v1/models/load", self.endpoint);
        let request = ApiLoadRequest {
            base_model,
            weights,
            device: device.device.to_string(),
            dtype: device.precision.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::BackendUnavailable(format!("worker unreachable at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendUnavailable(format!(
                "worker refused to load model ({}): {}",
                status, body
            )));
        }

        // An empty body is fine; the worker may not name its model.
        let body = response.text().await.unwrap_or_default();
        if let Ok(ApiLoadResponse { model: Some(model) }) = serde_json::from_str(&body) {
            self.name = model;
        }
        Ok(())
    }
}

fn encode_role(asset: &ImageAsset) -> Result<String> {
    Ok(codec::encode_base64(&codec::encode(asset, ImageFormat::Png, 100)?))
}

#[async_trait]
impl TryOnModel for RemoteModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        inputs: GenerationInputs<'_>,
        params: &SamplingParams,
    ) -> Result<GenerationOutput> {
        let url = format!("{}/v1/try-on", self.endpoint);
        debug!(endpoint = %self.endpoint, steps = params.num_inference_steps, "Sending try-on request");

        let api_request = ApiTryOnRequest {
            src_image: encode_role(inputs.src_image)?,
            ref_image: encode_role(inputs.ref_image)?,
            mask: encode_role(inputs.mask)?,
            densepose: encode_role(inputs.densepose)?,
            guidance_scale: params.guidance_scale,
            num_inference_steps: params.num_inference_steps,
            seed: params.seed,
            ref_acceleration: params.ref_acceleration,
        };

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Inference(format!(
                "worker returned {}: {}",
                status, body
            )));
        }

        let api_response = response
            .json::<ApiTryOnResponse>()
            .await
            .map_err(|e| AppError::Inference(format!("failed to parse worker response: {}", e)))?;

        let generated_image = api_response
            .generated_image
            .iter()
            .map(|encoded| {
                codec::decode_base64_image(encoded)
                    .map_err(|e| AppError::Inference(format!("worker returned a bad image: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GenerationOutput { generated_image })
    }
}

/// Loads the model onto a remote worker from the local checkpoint directory
pub struct RemoteModelLoader {
    config: ModelConfig,
}

impl RemoteModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for RemoteModelLoader {
    async fn load(&self) -> Result<LoadedBackend> {
        let endpoint = self.config.worker_endpoint.as_deref().ok_or_else(|| {
            AppError::BackendUnavailable("no inference worker configured".to_string())
        })?;

        let base_model = self.config.base_model_path();
        let weights = self.config.weights_path();
        if !base_model.is_dir() {
            return Err(AppError::BackendUnavailable(format!(
                "base model directory not found: {}",
                base_model.display()
            )));
        }
        if !weights.is_file() {
            return Err(AppError::BackendUnavailable(format!(
                "try-on weights not found: {}",
                weights.display()
            )));
        }

        let device = DeviceSelection::select(&self.config.accelerator);
        info!(
            endpoint = %endpoint,
            device = %device.device,
            dtype = %device.precision,
            "Selected device for try-on model"
        );

        let mut model = RemoteModel::new(endpoint, self.config.timeout_ms)?;
        model
            .load_remote(
                &base_model.to_string_lossy(),
                &weights.to_string_lossy(),
                device,
            )
            .await?;

        Ok(LoadedBackend {
            model: Arc::new(model),
            device,
        })
    }
}
