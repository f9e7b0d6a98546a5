//! Request gateway: validation, the decode-canonicalize-generate sequence and fallback routing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backend::traits::{ModelProvider, SamplingParams};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::gateway::archive::ResultArchive;
use crate::gateway::staging::StagingArea;
use crate::imaging::auxiliary::{AuxiliaryProvider, PlaceholderAuxiliary};
use crate::imaging::codec::{self, ImageFormat};
use crate::imaging::{ImageAsset, CANONICAL_HEIGHT, CANONICAL_WIDTH};
use crate::pipeline::fallback;
use crate::pipeline::orchestrator::InferenceOrchestrator;
use crate::pipeline::CanonicalPair;

/// Sampling parameters as they arrive on the wire; `None` takes the configured default
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParams {
    #[serde(default)]
    pub guidance_scale: Option<f64>,
    #[serde(default)]
    pub num_inference_steps: Option<i64>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub ref_acceleration: Option<bool>,
}

/// Parameter defaults and bounds applied to every request
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    pub defaults: SamplingParams,
    pub max_inference_steps: u32,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            defaults: SamplingParams::default(),
            max_inference_steps: 150,
        }
    }
}

impl RequestPolicy {
    /// Fill defaults and check bounds: guidance_scale > 0, steps in [1, max]
    pub fn resolve(&self, raw: &RawParams) -> Result<SamplingParams> {
        let guidance_scale = raw
            .guidance_scale
            .unwrap_or(self.defaults.guidance_scale as f64);
        if !guidance_scale.is_finite() || guidance_scale <= 0.0 {
            return Err(AppError::InvalidParameter(format!(
                "guidance_scale must be positive, got {}",
                guidance_scale
            )));
        }

        let steps = raw
            .num_inference_steps
            .unwrap_or(self.defaults.num_inference_steps as i64);
        if steps < 1 || steps > self.max_inference_steps as i64 {
            return Err(AppError::InvalidParameter(format!(
                "num_inference_steps must be in [1, {}], got {}",
                self.max_inference_steps, steps
            )));
        }

        Ok(SamplingParams {
            guidance_scale: guidance_scale as f32,
            num_inference_steps: steps as u32,
            seed: raw.seed.unwrap_or(self.defaults.seed),
            ref_acceleration: raw.ref_acceleration.unwrap_or(self.defaults.ref_acceleration),
        })
    }
}

/// A validated try-on request
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub human: ImageAsset,
    pub garment: ImageAsset,
    pub params: SamplingParams,
}

/// Why a placeholder composite was returned instead of a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The backend never loaded
    BackendUnavailable(String),
    /// The backend loaded but the generation failed
    InferenceFailed(String),
}

impl FallbackReason {
    pub fn tag(&self) -> &'static str {
        match self {
            FallbackReason::BackendUnavailable(_) => "backend_unavailable",
            FallbackReason::InferenceFailed(_) => "inference_failed",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::BackendUnavailable(cause) | FallbackReason::InferenceFailed(cause) => {
                write!(f, "{}: {}", self.tag(), cause)
            }
        }
    }
}

/// A genuine generation or a tagged placeholder
#[derive(Debug, Clone)]
pub enum TryOnOutcome {
    Generated(ImageAsset),
    Fallback {
        image: ImageAsset,
        reason: FallbackReason,
    },
}

/// Result of one pipeline invocation
#[derive(Debug, Clone)]
pub struct TryOnResult {
    pub outcome: TryOnOutcome,
    pub processing_time: Duration,
}

impl TryOnResult {
    pub fn image(&self) -> &ImageAsset {
        match &self.outcome {
            TryOnOutcome::Generated(image) => image,
            TryOnOutcome::Fallback { image, .. } => image,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self.outcome, TryOnOutcome::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.outcome {
            TryOnOutcome::Fallback { reason, .. } => Some(reason),
            TryOnOutcome::Generated(_) => None,
        }
    }
}

/// Wire response for a completed try-on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnResponse {
    /// JPEG data URL
    pub result_image: String,
    /// Seconds spent in the pipeline
    pub processing_time: f64,
    pub used_fallback: bool,
    pub fallback_reason: Option<String>,
    pub output_file: Option<String>,
}

/// Builder-style options for [`TryOnGateway`]
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub policy: RequestPolicy,
    pub strict_inference_errors: bool,
    pub deadline: Option<Duration>,
    pub staging_root: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub jpeg_quality: u8,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            policy: RequestPolicy::default(),
            strict_inference_errors: false,
            deadline: None,
            staging_root: std::env::temp_dir(),
            output_dir: None,
            jpeg_quality: 90,
        }
    }
}

impl GatewayOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let inference = &settings.inference;
        Self {
            policy: RequestPolicy {
                defaults: SamplingParams {
                    guidance_scale: inference.guidance_scale,
                    num_inference_steps: inference.num_inference_steps,
                    seed: inference.seed,
                    ref_acceleration: inference.ref_acceleration,
                },
                max_inference_steps: inference.max_inference_steps,
            },
            strict_inference_errors: inference.strict_inference_errors,
            deadline: inference.deadline_secs.map(Duration::from_secs),
            staging_root: settings.storage.staging_root(),
            output_dir: settings.storage.output_dir.as_ref().map(PathBuf::from),
            jpeg_quality: settings.storage.jpeg_quality,
        }
    }
}

/// Drives decode, canonicalization, generation (or fallback) and encoding
pub struct TryOnGateway {
    provider: Arc<dyn ModelProvider>,
    auxiliary: Arc<dyn AuxiliaryProvider>,
    orchestrator: InferenceOrchestrator,
    policy: RequestPolicy,
    strict_inference_errors: bool,
    staging: StagingArea,
    archive: ResultArchive,
    jpeg_quality: u8,
}

/// Run CPU-bound image work off the async executor
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Infrastructure(format!("image worker failed: {}", e)))?
}

impl TryOnGateway {
    pub fn new(provider: Arc<dyn ModelProvider>, options: GatewayOptions) -> Self {
        Self {
            provider,
            auxiliary: Arc::new(PlaceholderAuxiliary),
            orchestrator: InferenceOrchestrator::with_deadline(options.deadline),
            policy: options.policy,
            strict_inference_errors: options.strict_inference_errors,
            staging: StagingArea::new(options.staging_root),
            archive: ResultArchive::new(options.output_dir),
            jpeg_quality: options.jpeg_quality,
        }
    }

    /// Replace the placeholder mask/pose strategy
    pub fn with_auxiliary(mut self, auxiliary: Arc<dyn AuxiliaryProvider>) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.policy
    }

    /// Handle a request whose images are base64 text
    pub async fn run_base64(
        &self,
        human_image: String,
        garment_image: String,
        raw: &RawParams,
    ) -> Result<TryOnResult> {
        let params = self.policy.resolve(raw)?;
        let (human, garment) = blocking(move || {
            let human = codec::decode_base64_image(&human_image)?;
            let garment = codec::decode_base64_image(&garment_image)?;
            Ok((human, garment))
        })
        .await?;

        self.run(TryOnRequest { human, garment, params }).await
    }

    /// Handle a request whose images were uploaded as binary files.
    ///
    /// The payloads are staged to a per-request directory that is removed
    /// before this returns, whatever the outcome.
    pub async fn run_upload(
        &self,
        human_image: Vec<u8>,
        garment_image: Vec<u8>,
        raw: &RawParams,
    ) -> Result<TryOnResult> {
        let params = self.policy.resolve(raw)?;

        let staged = self.staging.stage().await?;
        let decoded: Result<(ImageAsset, ImageAsset)> = async {
            let human_path = staged.write("human_image", &human_image).await?;
            let garment_path = staged.write("garment_image", &garment_image).await?;
            let human_bytes = staged.read(&human_path).await?;
            let garment_bytes = staged.read(&garment_path).await?;
            blocking(move || {
                Ok((
                    codec::decode_bytes(&human_bytes)?,
                    codec::decode_bytes(&garment_bytes)?,
                ))
            })
            .await
        }
        .await;
        staged.close();

        let (human, garment) = decoded?;
        self.run(TryOnRequest { human, garment, params }).await
    }

    /// Run the pipeline on a validated request.
    ///
    /// Backend unavailability always falls back to the compositor. Inference
    /// faults fall back too unless strict mode is on. Everything else fails.
    pub async fn run(&self, request: TryOnRequest) -> Result<TryOnResult> {
        let request_id = Uuid::new_v4();
        let span = info_span!("tryon", request_id = %request_id);
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: TryOnRequest) -> Result<TryOnResult> {
        let start = Instant::now();
        let TryOnRequest { human, garment, params } = request;
        info!(
            human = ?human.dimensions(),
            garment = ?garment.dimensions(),
            "Processing try-on request"
        );

        let auxiliary = self.auxiliary.clone();
        let (pair, garment) = blocking(move || {
            let pair = CanonicalPair::prepare(
                &human,
                &garment,
                auxiliary.as_ref(),
                CANONICAL_WIDTH,
                CANONICAL_HEIGHT,
            )?;
            Ok((pair, garment))
        })
        .await?;

        let readiness = self.provider.ensure_loaded().await;
        let reason = match self.orchestrator.infer(&readiness, &pair, &params).await {
            Ok(generation) => {
                return Ok(TryOnResult {
                    outcome: TryOnOutcome::Generated(generation.image),
                    processing_time: start.elapsed(),
                });
            }
            Err(AppError::BackendUnavailable(cause)) => FallbackReason::BackendUnavailable(cause),
            Err(AppError::Inference(cause)) if !self.strict_inference_errors => {
                FallbackReason::InferenceFailed(cause)
            }
            Err(e) => return Err(e),
        };

        warn!(reason = %reason, "Serving fallback composite");
        let image = blocking(move || fallback::composite(&pair.human_canvas, &garment)).await?;

        Ok(TryOnResult {
            outcome: TryOnOutcome::Fallback { image, reason },
            processing_time: start.elapsed(),
        })
    }

    /// Encode a result as a JPEG data URL, archiving it when configured
    pub async fn respond(&self, result: TryOnResult) -> Result<TryOnResponse> {
        let quality = self.jpeg_quality;
        let used_fallback = result.used_fallback();
        let fallback_reason = result.fallback_reason().map(|r| r.to_string());
        let processing_time = result.processing_time.as_secs_f64();

        let jpeg = blocking(move || codec::encode(result.image(), ImageFormat::Jpeg, quality)).await?;
        let output_file = self.archive.save_jpeg(&jpeg).await?;

        Ok(TryOnResponse {
            result_image: codec::create_data_url(&jpeg, ImageFormat::Jpeg),
            processing_time,
            used_fallback,
            fallback_reason,
            output_file,
        })
    }
}
