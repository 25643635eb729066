pub mod builder;

use image::GrayImage;
use crate::{
    error::{MaskError, Result},
    types::{BoundingBox, Component, DetectedRegion},
    traits::{MaskPreprocessor, RegionDetector},
};

/// Region extraction: preprocess the mask onto a working grid, pick the
/// dominant component, and map its bounds back onto the base image.
pub struct RegionPipeline {
    preprocessors: Vec<Box<dyn MaskPreprocessor>>,
    detector: Box<dyn RegionDetector>,
}

impl RegionPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::RegionPipelineBuilder {
        builder::RegionPipelineBuilder::new()
    }

    pub fn new(preprocessors: Vec<Box<dyn MaskPreprocessor>>, detector: Box<dyn RegionDetector>) -> Self {
        Self { preprocessors, detector }
    }

    /// Find the dominant editable region of `mask` in `target_width` x
    /// `target_height` coordinates. `Ok(None)` means nothing was painted.
    #[tracing::instrument(level = "debug", skip_all, fields(mask_w = mask.width(), mask_h = mask.height()))]
    pub fn extract(&self, mask: &GrayImage, target_width: u32, target_height: u32) -> Result<Option<DetectedRegion>> {
        if target_width == 0 || target_height == 0 {
            return Err(MaskError::InvalidDimensions { width: target_width, height: target_height });
        }
        if mask.width() == 0 || mask.height() == 0 {
            return Ok(None);
        }

        let mut working = mask.clone();
        for preprocessor in &self.preprocessors {
            working = preprocessor.preprocess(&working)?;
        }

        let (component, component_count) = self.detector.detect(&working)?;
        let Some(component) = component.filter(|c| c.area > 0) else {
            tracing::debug!("no painted component above threshold");
            return Ok(None);
        };

        let bbox = map_to_target(&component, working.width(), working.height(), target_width, target_height)?;
        tracing::debug!(?bbox, area = component.area, component_count, "dominant region");

        Ok(Some(DetectedRegion {
            bbox,
            working_area: component.area,
            working_width: working.width(),
            working_height: working.height(),
            component_count,
        }))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!("RegionPipeline: {} preprocessors, 1 detector", self.preprocessors.len())
    }
}

/// Scale working-grid bounds to target pixels, rounding outward so the mapped
/// box covers every target pixel the component touches.
fn map_to_target(c: &Component, work_w: u32, work_h: u32, target_w: u32, target_h: u32) -> Result<BoundingBox> {
    let sx = target_w as f64 / work_w as f64;
    let sy = target_h as f64 / work_h as f64;

    let min_x = ((c.min_x as f64 * sx).floor() as u32).min(target_w - 1);
    let min_y = ((c.min_y as f64 * sy).floor() as u32).min(target_h - 1);
    let max_x = (((c.max_x + 1) as f64 * sx).ceil() as u32)
        .saturating_sub(1)
        .clamp(min_x, target_w - 1);
    let max_y = (((c.max_y + 1) as f64 * sy).ceil() as u32)
        .saturating_sub(1)
        .clamp(min_y, target_h - 1);

    BoundingBox::new(min_x, min_y, max_x, max_y, target_w, target_h)
}
