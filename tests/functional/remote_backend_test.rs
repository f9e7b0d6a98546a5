//! Functional tests for the remote inference worker backend

use image::{DynamicImage, Rgb, RgbImage};
use serde_json::json;
use tempfile::TempDir;
use tryon_gateway::backend::device::{Device, Precision};
use tryon_gateway::backend::http_backend::RemoteModelLoader;
use tryon_gateway::backend::traits::{
    GenerationInputs, ModelLoader, SamplingParams, TryOnModel,
};
use tryon_gateway::config::ModelConfig;
use tryon_gateway::imaging::codec::{self, ImageFormat};
use tryon_gateway::imaging::ImageAsset;
use tryon_gateway::AppError;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checkpoint_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("stable-diffusion-inpainting")).unwrap();
    std::fs::write(dir.path().join("virtual_tryon.pth"), b"weights").unwrap();
    dir
}

fn model_config(ckpts: &TempDir, endpoint: &str) -> ModelConfig {
    ModelConfig {
        checkpoint_dir: ckpts.path().to_string_lossy().to_string(),
        accelerator: "cpu".to_string(),
        worker_endpoint: Some(endpoint.to_string()),
        timeout_ms: 5_000,
        ..ModelConfig::default()
    }
}

fn solid(color: [u8; 3]) -> ImageAsset {
    ImageAsset::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        6,
        8,
        Rgb(color),
    )))
    .unwrap()
}

async fn mount_load(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/models/load"))
        .and(body_partial_json(json!({ "device": "cpu", "dtype": "float32" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "model": "tryon-sd15" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_and_generate() {
    let server = MockServer::start().await;
    let ckpts = checkpoint_dir();
    mount_load(&server).await;

    let result = solid([10, 200, 30]);
    let encoded = codec::encode_base64(&codec::encode(&result, ImageFormat::Png, 90).unwrap());
    Mock::given(method("POST"))
        .and(path("/v1/try-on"))
        .and(body_partial_json(json!({ "num_inference_steps": 12, "seed": 3 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "generated_image": [encoded] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let loaded = RemoteModelLoader::new(model_config(&ckpts, &server.uri()))
        .load()
        .await
        .map_err(|e| e.to_string())
        .unwrap();
    assert_eq!(loaded.device.device, Device::Cpu);
    assert_eq!(loaded.device.precision, Precision::Float32);
    assert_eq!(loaded.model.name(), "tryon-sd15");

    let (src, reference, mask, pose) = (
        solid([0, 0, 255]),
        solid([255, 0, 0]),
        solid([255, 255, 255]),
        solid([1, 1, 1]),
    );
    let params = SamplingParams {
        num_inference_steps: 12,
        seed: 3,
        ..SamplingParams::default()
    };
    let output = loaded
        .model
        .generate(
            GenerationInputs {
                src_image: &src,
                ref_image: &reference,
                mask: &mask,
                densepose: &pose,
            },
            &params,
        )
        .await
        .unwrap();

    assert_eq!(output.generated_image.len(), 1);
    assert_eq!(output.generated_image[0], result);
}

#[tokio::test]
async fn test_worker_error_is_inference_error() {
    let server = MockServer::start().await;
    let ckpts = checkpoint_dir();
    mount_load(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/try-on"))
        .respond_with(ResponseTemplate::new(500).set_body_string("CUDA out of memory"))
        .mount(&server)
        .await;

    let loaded = RemoteModelLoader::new(model_config(&ckpts, &server.uri()))
        .load()
        .await
        .map_err(|e| e.to_string())
        .unwrap();

    let image = solid([0, 0, 0]);
    let err = loaded
        .model
        .generate(
            GenerationInputs {
                src_image: &image,
                ref_image: &image,
                mask: &image,
                densepose: &image,
            },
            &SamplingParams::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Inference(message) if message.contains("CUDA out of memory")));
}

#[tokio::test]
async fn test_empty_result_list_is_passed_through() {
    let server = MockServer::start().await;
    let ckpts = checkpoint_dir();
    mount_load(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/try-on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generated_image": [] })))
        .mount(&server)
        .await;

    let loaded = RemoteModelLoader::new(model_config(&ckpts, &server.uri()))
        .load()
        .await
        .map_err(|e| e.to_string())
        .unwrap();

    let image = solid([0, 0, 0]);
    let output = loaded
        .model
        .generate(
            GenerationInputs {
                src_image: &image,
                ref_image: &image,
                mask: &image,
                densepose: &image,
            },
            &SamplingParams::default(),
        )
        .await
        .unwrap();

    assert!(output.generated_image.is_empty());
}

#[tokio::test]
async fn test_load_refusal_is_unavailable() {
    let server = MockServer::start().await;
    let ckpts = checkpoint_dir();

    Mock::given(method("POST"))
        .and(path("/v1/models/load"))
        .respond_with(ResponseTemplate::new(503).set_body_string("no GPU memory"))
        .mount(&server)
        .await;

    let err = RemoteModelLoader::new(model_config(&ckpts, &server.uri()))
        .load()
        .await
        .err()
        .unwrap();

    assert!(matches!(err, AppError::BackendUnavailable(message) if message.contains("no GPU memory")));
}

#[tokio::test]
async fn test_missing_weights_skip_worker() {
    let server = MockServer::start().await;
    let ckpts = tempfile::tempdir().unwrap();
    std::fs::create_dir(ckpts.path().join("stable-diffusion-inpainting")).unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = RemoteModelLoader::new(model_config(&ckpts, &server.uri()))
        .load()
        .await
        .err()
        .unwrap();

    assert!(matches!(err, AppError::BackendUnavailable(message) if message.contains("virtual_tryon.pth")));
}
