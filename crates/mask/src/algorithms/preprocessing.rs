use image::GrayImage;
use crate::{error::Result, traits::MaskPreprocessor};

/// Intensity at or below which a downscaled mask cell counts as background.
///
/// Box downscaling averages brush strokes with their surroundings, so this stays
/// low; it only has to reject faint antialiasing and canvas noise.
pub const DEFAULT_ON_THRESHOLD: u8 = 24;

/// Longest side of the grid connected-component search runs on.
pub const DEFAULT_WORKING_MAX_SIDE: u32 = 256;

/// Dimensions of `width` x `height` scaled to fit inside `max_side`, never enlarging.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side || max_side == 0 {
        return (width, height);
    }
    let scale = max_side as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_side);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_side);
    (w, h)
}

/// Area-averaging downscale so the longest side is at most `max_side`
#[derive(Debug, Clone)]
pub struct DownscalePreprocessor {
    pub max_side: u32,
}

impl Default for DownscalePreprocessor {
    fn default() -> Self {
        Self { max_side: DEFAULT_WORKING_MAX_SIDE }
    }
}

impl MaskPreprocessor for DownscalePreprocessor {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        let (w, h) = fit_within(mask.width(), mask.height(), self.max_side);
        if (w, h) == mask.dimensions() {
            return Ok(mask.clone());
        }
        Ok(image::imageops::thumbnail(mask, w, h))
    }
}

/// Simple thresholding preprocessor
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: DEFAULT_ON_THRESHOLD }
    }
}

impl MaskPreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(mask, self.threshold))
    }
}

/// Swaps editable and protected intensities
#[derive(Debug, Clone, Default)]
pub struct InvertPreprocessor;

impl MaskPreprocessor for InvertPreprocessor {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        let mut out = mask.clone();
        image::imageops::invert(&mut out);
        Ok(out)
    }
}

/// Gaussian blur used to feather mask edges.
///
/// The kernel is normalised, so flat regions keep their value: fully painted
/// interiors stay at 255 and untouched background stays at 0.
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl MaskPreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, mask: &GrayImage) -> Result<GrayImage> {
        // imageops::blur panics unless sigma is a normal positive float
        if !(self.sigma.is_normal() && self.sigma > 0.0) {
            return Ok(mask.clone());
        }
        Ok(image::imageops::blur(mask, self.sigma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_fit_within_keeps_aspect() {
        assert_eq!(fit_within(1024, 512, 256), (256, 128));
        assert_eq!(fit_within(300, 1200, 256), (64, 256));
        assert_eq!(fit_within(100, 80, 256), (100, 80));
        assert_eq!(fit_within(5000, 3, 256), (256, 1));
    }

    #[test]
    fn test_downscale_caps_longest_side() {
        let mask = GrayImage::from_pixel(1000, 600, Luma([255u8]));
        let small = DownscalePreprocessor::default().preprocess(&mask).unwrap();
        assert_eq!(small.width(), 256);
        assert!(small.height() <= 256);
        assert!(small.pixels().all(|p| p.0[0] > 200));
    }

    #[test]
    fn test_threshold_drops_faint_noise() {
        let mut mask = GrayImage::new(4, 1);
        mask.put_pixel(0, 0, Luma([10u8]));
        mask.put_pixel(1, 0, Luma([DEFAULT_ON_THRESHOLD]));
        mask.put_pixel(2, 0, Luma([DEFAULT_ON_THRESHOLD + 1]));
        mask.put_pixel(3, 0, Luma([255u8]));
        let binary = ThresholdPreprocessor::default().preprocess(&mask).unwrap();
        let values: Vec<u8> = binary.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_invert_and_zero_blur() {
        let mask = GrayImage::from_pixel(3, 3, Luma([200u8]));
        let inverted = InvertPreprocessor.preprocess(&mask).unwrap();
        assert_eq!(inverted.get_pixel(1, 1).0[0], 55);

        let unblurred = GaussianBlurPreprocessor { sigma: 0.0 }.preprocess(&mask).unwrap();
        assert_eq!(unblurred, mask);
        let tiny = GaussianBlurPreprocessor { sigma: 1e-40 }.preprocess(&mask).unwrap();
        assert_eq!(tiny, mask);
    }

    #[test]
    fn test_blur_keeps_flat_regions_flat() {
        for value in [0u8, 200, 255] {
            let mask = GrayImage::from_pixel(30, 30, Luma([value]));
            let blurred = GaussianBlurPreprocessor { sigma: 4.0 }.preprocess(&mask).unwrap();
            assert!(blurred.pixels().all(|p| p.0[0] == value), "flat {value} drifted");
        }
    }
}
