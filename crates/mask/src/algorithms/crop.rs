use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    error::{MaskError, Result},
    types::{BoundingBox, CropRect},
};

pub const DEFAULT_MIN_MARGIN: u32 = 24;
pub const DEFAULT_MARGIN_FRACTION: f32 = 0.03;

/// Expands a region's bounding box into the crop sent to the remote model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CropPlanner {
    /// Smallest margin in pixels, whatever the image size.
    pub min_margin: u32,
    /// Margin as a fraction of the longer image side.
    pub margin_fraction: f32,
}

impl Default for CropPlanner {
    fn default() -> Self {
        Self {
            min_margin: DEFAULT_MIN_MARGIN,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
        }
    }
}

impl CropPlanner {
    pub fn margin(&self, width: u32, height: u32) -> u32 {
        let fractional = (self.margin_fraction.max(0.0) as f64 * width.max(height) as f64).ceil() as u32;
        self.min_margin.max(fractional)
    }

    /// Crop rect around `bbox` for a `width` x `height` image.
    pub fn plan(&self, bbox: &BoundingBox, width: u32, height: u32) -> Result<CropRect> {
        self.plan_with_padding(bbox, width, height, 0)
    }

    /// Like [`plan`](Self::plan), but the margin is at least `padding` pixels.
    pub fn plan_with_padding(
        &self,
        bbox: &BoundingBox,
        width: u32,
        height: u32,
        padding: u32,
    ) -> Result<CropRect> {
        if width == 0 || height == 0 {
            return Err(MaskError::InvalidDimensions { width, height });
        }
        let margin = self.margin(width, height).max(padding);

        let left = bbox.min_x.saturating_sub(margin).min(width - 1);
        let top = bbox.min_y.saturating_sub(margin).min(height - 1);
        let right = bbox.max_x.saturating_add(margin).clamp(left, width - 1);
        let bottom = bbox.max_y.saturating_add(margin).clamp(top, height - 1);

        let rect = CropRect {
            left,
            top,
            width: right - left + 1,
            height: bottom - top + 1,
        };
        tracing::debug!(?bbox, ?rect, margin, "planned crop");
        Ok(rect)
    }
}

/// Pixels a gaussian feather of `radius` visibly spreads past the stroke edge.
pub fn feather_extent(radius: f32) -> u32 {
    if radius.is_finite() && radius > 0.0 {
        (radius * 3.0).ceil() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_uses_fraction_on_large_images() {
        let planner = CropPlanner::default();
        assert_eq!(planner.margin(100, 80), DEFAULT_MIN_MARGIN);
        assert_eq!(planner.margin(4000, 3000), 120);
    }

    #[test]
    fn test_interior_bbox_expands_by_margin() {
        let planner = CropPlanner::default();
        let bbox = BoundingBox::new(100, 100, 199, 149, 1000, 1000).unwrap();
        let crop = planner.plan(&bbox, 1000, 1000).unwrap();
        assert_eq!(crop, CropRect { left: 70, top: 70, width: 160, height: 110 });
        assert!(crop.covers(&bbox));
    }

    #[test]
    fn test_edges_clamp_on_all_sides() {
        let planner = CropPlanner::default();
        for (w, h) in [(10, 10), (1, 1), (37, 5), (640, 480), (3000, 2000)] {
            let full = BoundingBox::new(0, 0, w - 1, h - 1, w, h).unwrap();
            let crop = planner.plan(&full, w, h).unwrap();
            assert_eq!(crop, CropRect { left: 0, top: 0, width: w, height: h });

            let corner = BoundingBox::new(w - 1, h - 1, w - 1, h - 1, w, h).unwrap();
            let crop = planner.plan(&corner, w, h).unwrap();
            assert_eq!(crop.right(), w);
            assert_eq!(crop.bottom(), h);
            assert!(crop.fits(w, h));
            assert!(crop.covers(&corner));

            let origin = BoundingBox::new(0, 0, 0, 0, w, h).unwrap();
            let crop = planner.plan(&origin, w, h).unwrap();
            assert_eq!((crop.left, crop.top), (0, 0));
            assert!(crop.fits(w, h));
        }
    }

    #[test]
    fn test_padding_widens_margin() {
        let planner = CropPlanner::default();
        let bbox = BoundingBox::new(500, 500, 510, 510, 1000, 1000).unwrap();
        let plain = planner.plan(&bbox, 1000, 1000).unwrap();
        let padded = planner.plan_with_padding(&bbox, 1000, 1000, feather_extent(20.0)).unwrap();
        assert_eq!(plain.left, 470);
        assert_eq!(padded.left, 440);
        assert!(padded.width > plain.width);
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        let bbox = BoundingBox { min_x: 0, min_y: 0, max_x: 0, max_y: 0 };
        assert!(CropPlanner::default().plan(&bbox, 0, 10).is_err());
    }
}
