//! Image assets and the transforms applied before generation

pub mod auxiliary;
pub mod canonical;
pub mod codec;

use image::{DynamicImage, GenericImageView};

use crate::error::{AppError, Result};

/// Fixed width every backend input is resized to
pub const CANONICAL_WIDTH: u32 = 768;
/// Fixed height every backend input is resized to
pub const CANONICAL_HEIGHT: u32 = 1024;

/// Pixel layout of an [`ImageAsset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> u8 {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// In-memory raster with non-zero dimensions stored as RGB8 or RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    image: DynamicImage,
}

impl ImageAsset {
    /// Wrap a decoded image, normalizing it to RGB8 or RGBA8.
    ///
    /// Images carrying an alpha channel keep it; everything else (grayscale,
    /// 16-bit, float) is converted to RGB8.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AppError::InvalidImage(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let image = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn layout(&self) -> ChannelLayout {
        match self.image {
            DynamicImage::ImageRgba8(_) => ChannelLayout::Rgba,
            _ => ChannelLayout::Rgb,
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.layout() == ChannelLayout::Rgba
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}
