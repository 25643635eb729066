use image::GrayImage;
use crate::{error::Result, types::Component};

/// Trait for mask preprocessing steps (downscale, threshold, ...)
pub trait MaskPreprocessor: Send + Sync {
    /// Transform the mask ahead of region detection
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage>;
}

/// Trait for picking the editable region out of a binary mask
pub trait RegionDetector: Send + Sync {
    /// Return the retained component, plus the total number of components seen.
    /// `None` means nothing was painted.
    fn detect(&self, binary: &GrayImage) -> Result<(Option<Component>, usize)>;
}
