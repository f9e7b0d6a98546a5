//! Deterministic placeholder composite used when the backend cannot generate
//!
//! The garment is scaled to half the human's width and pasted over the upper
//! body: horizontally centered, top edge at one third of the human's height.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};

use crate::error::Result;
use crate::imaging::ImageAsset;

/// Where the garment lands on the human image.
///
/// `height` is the drawn height, already clipped at the human's bottom edge.
/// `source_rows` is how many garment rows, from the top, end up visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub source_rows: u32,
}

/// Overlay geometry for a garment of `garment` size on a human of `human` size
pub fn overlay_region(human: (u32, u32), garment: (u32, u32)) -> OverlayRegion {
    let (human_w, human_h) = human;
    let (garment_w, garment_h) = garment;

    let width = (human_w / 2).max(1);
    let y = human_h / 3;
    let full_height = ((garment_h as f64 * width as f64 / garment_w as f64).round() as u64).max(1);
    let height = full_height.min((human_h - y).max(1) as u64);

    // Rows of the source that map onto the visible part, rounded up
    let source_rows = (height * garment_h as u64).div_ceil(full_height).clamp(1, garment_h as u64);

    OverlayRegion {
        x: (human_w - width) / 2,
        y,
        width,
        height: height as u32,
        source_rows: source_rows as u32,
    }
}

/// Scale the visible rows of `garment` to the region size
fn fit_garment(garment: &ImageAsset, region: &OverlayRegion) -> DynamicImage {
    let source = garment.as_dynamic();
    let visible = if region.source_rows < source.height() {
        source.crop_imm(0, 0, source.width(), region.source_rows)
    } else {
        source.clone()
    };
    visible.resize_exact(region.width, region.height, FilterType::Lanczos3)
}

/// Paste `garment` over the upper body of `human`.
///
/// Garments with an alpha channel are alpha-blended; opaque garments replace
/// the pixels underneath. Parts extending past the bottom edge are clipped
/// before scaling, so only the visible rows are ever resampled.
/// The result has the human's dimensions and channel layout.
pub fn composite(human: &ImageAsset, garment: &ImageAsset) -> Result<ImageAsset> {
    let region = overlay_region(human.dimensions(), garment.dimensions());
    let (x, y) = (region.x as i64, region.y as i64);
    let top = fit_garment(garment, &region);

    let result = match human.as_dynamic() {
        DynamicImage::ImageRgba8(base) => {
            let mut base = base.clone();
            if garment.has_alpha() {
                imageops::overlay(&mut base, &top.to_rgba8(), x, y);
            } else {
                imageops::replace(&mut base, &top.to_rgba8(), x, y);
            }
            DynamicImage::ImageRgba8(base)
        }
        other => {
            let mut base = other.to_rgb8();
            if garment.has_alpha() {
                let mut blended = DynamicImage::ImageRgb8(base).to_rgba8();
                imageops::overlay(&mut blended, &top.to_rgba8(), x, y);
                base = DynamicImage::ImageRgba8(blended).to_rgb8();
            } else {
                imageops::replace(&mut base, &top.to_rgb8(), x, y);
            }
            DynamicImage::ImageRgb8(base)
        }
    };

    debug_assert_eq!(result.dimensions(), human.dimensions());
    ImageAsset::from_dynamic(result)
}
