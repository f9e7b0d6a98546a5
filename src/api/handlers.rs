//! HTTP handlers for the try-on endpoints

use axum::{
    extract::{multipart::Field, rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::gateway::{RawParams, TryOnResponse};
use crate::AppState;

/// JSON try-on request with base64 images
#[derive(Debug, Deserialize)]
pub struct TryOnPayload {
    pub human_image: String,
    pub garment_image: String,
    #[serde(flatten)]
    pub params: RawParams,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend_ready: bool,
    pub load_attempted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Virtual try-on API. POST /try-on with base64 images or /try-on/upload with files."
            .to_string(),
    })
}

/// Readiness probe. Never triggers a backend load.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let provider = state.gateway.provider();
    Json(HealthResponse {
        status: "ok".to_string(),
        backend_ready: provider.is_ready(),
        load_attempted: provider.load_attempted(),
    })
}

pub async fn try_on(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TryOnPayload>, JsonRejection>,
) -> Result<Json<TryOnResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let result = state
        .gateway
        .run_base64(payload.human_image, payload.garment_image, &payload.params)
        .await?;
    Ok(Json(state.gateway.respond(result).await?))
}

pub async fn try_on_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TryOnResponse>> {
    let mut human_image = None;
    let mut garment_image = None;
    let mut params = RawParams::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "human_image" => human_image = Some(file_field(field).await?),
            "garment_image" => garment_image = Some(file_field(field).await?),
            "guidance_scale" => params.guidance_scale = Some(text_field(field, &name).await?),
            "num_inference_steps" => {
                params.num_inference_steps = Some(text_field(field, &name).await?)
            }
            "seed" => params.seed = Some(text_field(field, &name).await?),
            "ref_acceleration" => {
                let value: String = text_field(field, &name).await?;
                params.ref_acceleration = Some(parse_bool(&value).ok_or_else(|| {
                    AppError::InvalidParameter(format!("ref_acceleration is not a boolean: {}", value))
                })?);
            }
            _ => debug!(field = %name, "Ignoring unknown multipart field"),
        }
    }

    let human_image = human_image
        .ok_or_else(|| AppError::InvalidRequest("missing file field 'human_image'".to_string()))?;
    let garment_image = garment_image
        .ok_or_else(|| AppError::InvalidRequest("missing file field 'garment_image'".to_string()))?;

    let result = state
        .gateway
        .run_upload(human_image, garment_image, &params)
        .await?;
    Ok(Json(state.gateway.respond(result).await?))
}

async fn file_field(field: Field<'_>) -> Result<Vec<u8>> {
    field
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| AppError::InvalidRequest(format!("failed to read upload: {}", e)))
}

async fn text_field<T: FromStr>(field: Field<'_>, name: &str) -> Result<T> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read field '{}': {}", name, e)))?;
    text.trim()
        .parse()
        .map_err(|_| AppError::InvalidParameter(format!("{} has an invalid value: {}", name, text)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
