//! Auxiliary conditioning inputs (mask and pose) for the generative backend
//!
//! A full deployment derives these from human-parsing and dense-pose models.
//! Those models are not part of this service, so the default strategy feeds
//! the backend an all-permissive mask and an uninformative pose map.

use image::{DynamicImage, Rgb, RgbImage};

use crate::error::Result;
use crate::imaging::ImageAsset;

/// Mask and pose images matching one canonical human canvas
#[derive(Debug, Clone)]
pub struct AuxiliaryInputs {
    pub mask: ImageAsset,
    pub pose: ImageAsset,
}

/// Source of the mask and pose conditioning images
pub trait AuxiliaryProvider: Send + Sync {
    /// Strategy name, for logs
    fn name(&self) -> &str;

    /// Produce mask and pose images with the same dimensions as `human`
    fn prepare(&self, human: &ImageAsset) -> Result<AuxiliaryInputs>;
}

/// Placeholder strategy: full-white mask, all-ones pose.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAuxiliary;

/// Mask value marking a pixel as eligible for modification
pub const MASK_VALUE: u8 = 255;
/// Fill value of the placeholder pose map
pub const POSE_VALUE: u8 = 1;

impl AuxiliaryProvider for PlaceholderAuxiliary {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn prepare(&self, human: &ImageAsset) -> Result<AuxiliaryInputs> {
        let (width, height) = human.dimensions();
        let mask = RgbImage::from_pixel(width, height, Rgb([MASK_VALUE; 3]));
        let pose = RgbImage::from_pixel(width, height, Rgb([POSE_VALUE; 3]));

        Ok(AuxiliaryInputs {
            mask: ImageAsset::from_dynamic(DynamicImage::ImageRgb8(mask))?,
            pose: ImageAsset::from_dynamic(DynamicImage::ImageRgb8(pose))?,
        })
    }
}
