//! Image payload decoding and encoding
//!
//! Inbound images arrive as base64 text (with or without a data-URI prefix)
//! or as raw uploaded bytes. Outbound images leave as JPEG, optionally
//! wrapped in a data URL.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;

use crate::error::{AppError, Result};
use crate::imaging::ImageAsset;

/// Container format for encoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Encode binary data to base64 string
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Strip an optional `data:<mime>;base64,` prefix
pub fn strip_data_url(encoded: &str) -> &str {
    let encoded = encoded.trim();
    if encoded.starts_with("data:") {
        match encoded.split_once(',') {
            Some((_, data)) => data,
            None => encoded,
        }
    } else {
        encoded
    }
}

/// Decode base64 text, with or without data-URL prefix, to binary data.
///
/// Line breaks and other ASCII whitespace inside the payload are ignored.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = strip_data_url(encoded)
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| AppError::Decode(format!("invalid base64 data: {}", e)))
}

/// Decode an uploaded binary payload into an image
pub fn decode_bytes(data: &[u8]) -> Result<ImageAsset> {
    if data.is_empty() {
        return Err(AppError::Decode("image payload is empty".to_string()));
    }

    let image = image::load_from_memory(data)
        .map_err(|e| AppError::Decode(format!("unsupported or corrupt image: {}", e)))?;
    ImageAsset::from_dynamic(image)
}

/// Decode a base64 (optionally data-URL prefixed) payload into an image
pub fn decode_base64_image(encoded: &str) -> Result<ImageAsset> {
    let data = decode_base64(encoded)?;
    decode_bytes(&data)
}

/// Encode an image into the given container format.
///
/// JPEG has no alpha channel, so RGBA images are flattened to RGB first.
/// `quality` only applies to JPEG.
pub fn encode(asset: &ImageAsset, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    let written = match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(asset.as_dynamic().to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
        }
        ImageFormat::Png => asset.as_dynamic().write_with_encoder(PngEncoder::new(&mut buffer)),
    };

    written.map_err(|e| AppError::Infrastructure(format!("failed to encode image: {}", e)))?;
    Ok(buffer)
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), encode_base64(data))
}

/// Encode an image and wrap it in a data URL
pub fn encode_data_url(asset: &ImageAsset, format: ImageFormat, quality: u8) -> Result<String> {
    let data = encode(asset, format, quality)?;
    Ok(create_data_url(&data, format))
}
