use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};

/// Inclusive pixel bounds of a region, in base-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// Build a box, checking `min <= max` on both axes and that it fits a
    /// `width` x `height` image.
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || min_x > max_x || min_y > max_y || max_x >= width || max_y >= height {
            return Err(MaskError::InvalidDimensions { width, height });
        }
        Ok(Self { min_x, min_y, max_x, max_y })
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Sub-rectangle of the base image sent to the remote model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Whether the rect is non-empty and lies inside a `width` x `height` frame.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width >= 1 && self.height >= 1 && self.right() <= width && self.bottom() <= height
    }

    pub fn covers(&self, bbox: &BoundingBox) -> bool {
        self.left <= bbox.min_x
            && self.top <= bbox.min_y
            && self.right() > bbox.max_x
            && self.bottom() > bbox.max_y
    }
}

/// Largest feather radius accepted, in pixels.
pub const MAX_FEATHER_RADIUS: f32 = 256.0;

/// Editing modifiers painted alongside a mask.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct MaskMeta {
    /// Treat bright pixels as protected instead of editable.
    pub invert: bool,
    /// Blur radius in pixels applied to mask edges before compositing.
    pub feather_radius: f32,
}

impl MaskMeta {
    pub fn new(invert: bool, feather_radius: f32) -> Result<Self> {
        let meta = Self { invert, feather_radius };
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_FEATHER_RADIUS).contains(&self.feather_radius) {
            return Err(MaskError::InvalidFeather(self.feather_radius));
        }
        Ok(())
    }
}

/// The dominant connected region found in a mask.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectedRegion {
    /// Bounds in target (base-image) coordinates.
    pub bbox: BoundingBox,
    /// Pixel count of the component on the working grid.
    pub working_area: usize,
    /// Dimensions of the working grid the component was found on.
    pub working_width: u32,
    pub working_height: u32,
    /// Number of connected components seen, including the retained one.
    pub component_count: usize,
}

/// A connected component on the working grid, in working coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_rejects_out_of_frame() {
        assert!(BoundingBox::new(0, 0, 9, 9, 10, 10).is_ok());
        assert!(BoundingBox::new(0, 0, 10, 9, 10, 10).is_err());
        assert!(BoundingBox::new(5, 0, 4, 9, 10, 10).is_err());
    }

    #[test]
    fn test_crop_rect_covers_bbox() {
        let bbox = BoundingBox::new(10, 10, 20, 20, 100, 100).unwrap();
        let crop = CropRect { left: 5, top: 5, width: 16, height: 16 };
        assert!(crop.covers(&bbox));
        let short = CropRect { left: 5, top: 5, width: 15, height: 16 };
        assert!(!short.covers(&bbox));
    }

    #[test]
    fn test_mask_meta_rejects_negative_feather() {
        assert!(MaskMeta::new(false, -1.0).is_err());
        assert!(MaskMeta::new(false, f32::NAN).is_err());
        assert!(MaskMeta::new(true, 0.0).is_ok());
    }

    #[test]
    fn test_mask_meta_rejects_oversized_feather() {
        assert!(MaskMeta::new(false, MAX_FEATHER_RADIUS).is_ok());
        assert!(MaskMeta::new(false, MAX_FEATHER_RADIUS + 1.0).is_err());
        assert!(MaskMeta::new(false, 1e20).is_err());
        assert!(MaskMeta::new(false, f32::INFINITY).is_err());
    }
}
