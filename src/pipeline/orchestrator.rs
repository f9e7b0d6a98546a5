//! Drives one generation against a loaded backend

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::backend::traits::{GenerationInputs, Readiness, SamplingParams};
use crate::error::{AppError, Result};
use crate::imaging::ImageAsset;
use crate::pipeline::CanonicalPair;

/// A generated image and how long the backend took
#[derive(Debug, Clone)]
pub struct Generation {
    pub image: ImageAsset,
    pub elapsed: Duration,
}

/// Assembles backend requests, invokes the backend once and extracts the result.
#[derive(Debug, Clone, Default)]
pub struct InferenceOrchestrator {
    deadline: Option<Duration>,
}

impl InferenceOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort generations that run longer than `deadline`
    pub fn with_deadline(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    /// Run one generation.
    ///
    /// Fails with `BackendUnavailable` unless `readiness` is `Ready`. Backend
    /// failures come back as `Inference`; exceeding the deadline as `Timeout`.
    /// Nothing is retried.
    pub async fn infer(
        &self,
        readiness: &Readiness,
        pair: &CanonicalPair,
        params: &SamplingParams,
    ) -> Result<Generation> {
        let model = match readiness {
            Readiness::Ready(model) => model,
            Readiness::Unavailable(reason) => {
                return Err(AppError::BackendUnavailable(reason.clone()))
            }
        };

        let inputs = GenerationInputs {
            src_image: &pair.human_canvas,
            ref_image: &pair.garment_canvas,
            mask: &pair.aux_mask,
            densepose: &pair.aux_pose,
        };

        debug!(
            model = %model.name(),
            guidance_scale = params.guidance_scale,
            steps = params.num_inference_steps,
            seed = params.seed,
            ref_acceleration = params.ref_acceleration,
            "Running inference"
        );

        let start = Instant::now();
        let call = model.generate(inputs, params);
        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call).await.map_err(|_| {
                AppError::Timeout(format!(
                    "inference exceeded the {}s deadline",
                    deadline.as_secs_f64()
                ))
            })?,
            None => call.await,
        };

        let output = result.map_err(|e| match e {
            AppError::Inference(cause) => AppError::Inference(cause),
            other => AppError::Inference(other.to_string()),
        })?;

        let image = output
            .generated_image
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Inference("backend returned no image".to_string()))?;

        let elapsed = start.elapsed();
        info!(elapsed_secs = elapsed.as_secs_f64(), "Inference completed");
        Ok(Generation { image, elapsed })
    }
}
