//! Letterboxing of arbitrary images onto the fixed backend canvas

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{AppError, Result};
use crate::imaging::ImageAsset;

/// Canvas fill around letterboxed content
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Where the scaled source landed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest size with the source's aspect ratio that fits inside the target box.
pub fn fit_dimensions(width: u32, height: u32, target_width: u32, target_height: u32) -> (u32, u32) {
    let scale = f64::min(
        target_width as f64 / width as f64,
        target_height as f64 / height as f64,
    );
    let fit_w = ((width as f64 * scale).round() as u32).clamp(1, target_width);
    let fit_h = ((height as f64 * scale).round() as u32).clamp(1, target_height);
    (fit_w, fit_h)
}

/// Centered placement of a `width`x`height` source inside the target box
pub fn placement(width: u32, height: u32, target_width: u32, target_height: u32) -> Placement {
    let (fit_w, fit_h) = fit_dimensions(width, height, target_width, target_height);
    Placement {
        offset_x: (target_width - fit_w) / 2,
        offset_y: (target_height - fit_h) / 2,
        width: fit_w,
        height: fit_h,
    }
}

/// Scale `asset` to fit inside `target_width`x`target_height` and center it on a
/// white RGB canvas of exactly that size.
///
/// Transparent regions of RGBA sources are composited over the background.
/// Output is deterministic for a given input and target.
pub fn canonicalize(asset: &ImageAsset, target_width: u32, target_height: u32) -> Result<ImageAsset> {
    if target_width == 0 || target_height == 0 {
        return Err(AppError::InvalidImage(format!(
            "target dimensions must be positive, got {}x{}",
            target_width, target_height
        )));
    }
    let (width, height) = asset.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::InvalidImage(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }

    let spot = placement(width, height, target_width, target_height);
    let mut canvas = RgbImage::from_pixel(target_width, target_height, BACKGROUND);

    match asset.as_dynamic() {
        DynamicImage::ImageRgba8(rgba) => {
            let scaled = if (spot.width, spot.height) == (width, height) {
                rgba.clone()
            } else {
                imageops::resize(rgba, spot.width, spot.height, FilterType::Lanczos3)
            };
            let mut backdrop = DynamicImage::ImageRgb8(canvas).to_rgba8();
            imageops::overlay(&mut backdrop, &scaled, spot.offset_x as i64, spot.offset_y as i64);
            canvas = DynamicImage::ImageRgba8(backdrop).to_rgb8();
        }
        other => {
            let rgb = other.to_rgb8();
            let scaled = if (spot.width, spot.height) == (width, height) {
                rgb
            } else {
                imageops::resize(&rgb, spot.width, spot.height, FilterType::Lanczos3)
            };
            imageops::replace(&mut canvas, &scaled, spot.offset_x as i64, spot.offset_y as i64);
        }
    }

    ImageAsset::from_dynamic(DynamicImage::ImageRgb8(canvas))
}
