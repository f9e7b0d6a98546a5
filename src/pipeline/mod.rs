//! The generation pipeline: canonical inputs, the orchestrator and the fallback compositor

pub mod fallback;
pub mod orchestrator;

use crate::error::Result;
use crate::imaging::auxiliary::AuxiliaryProvider;
use crate::imaging::canonical::canonicalize;
use crate::imaging::ImageAsset;

/// Backend-ready inputs derived from one request
#[derive(Debug, Clone)]
pub struct CanonicalPair {
    pub human_canvas: ImageAsset,
    pub garment_canvas: ImageAsset,
    pub aux_mask: ImageAsset,
    pub aux_pose: ImageAsset,
}

impl CanonicalPair {
    /// Letterbox both images onto `width`x`height` canvases and derive the auxiliary inputs
    pub fn prepare(
        human: &ImageAsset,
        garment: &ImageAsset,
        auxiliary: &dyn AuxiliaryProvider,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let human_canvas = canonicalize(human, width, height)?;
        let garment_canvas = canonicalize(garment, width, height)?;
        let aux = auxiliary.prepare(&human_canvas)?;

        Ok(Self {
            human_canvas,
            garment_canvas,
            aux_mask: aux.mask,
            aux_pose: aux.pose,
        })
    }
}
