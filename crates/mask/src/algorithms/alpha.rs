use image::{GrayImage, imageops::FilterType};
use crate::{
    error::{MaskError, Result},
    traits::MaskPreprocessor,
    types::MaskMeta,
    algorithms::{GaussianBlurPreprocessor, InvertPreprocessor},
};

/// Resample a mask to `width` x `height` (bilinear stretch, no repainting).
pub fn resize_to(mask: &GrayImage, width: u32, height: u32) -> Result<GrayImage> {
    if width == 0 || height == 0 {
        return Err(MaskError::InvalidDimensions { width, height });
    }
    if mask.dimensions() == (width, height) {
        return Ok(mask.clone());
    }
    Ok(image::imageops::resize(mask, width, height, FilterType::Triangle))
}

/// Mask in the canonical "white = editable" convention at base-image size.
///
/// Feather is not applied; this is what region extraction runs on.
pub fn canonical_mask(mask: &GrayImage, width: u32, height: u32, invert: bool) -> Result<GrayImage> {
    let resized = resize_to(mask, width, height)?;
    if invert {
        InvertPreprocessor.preprocess(&resized)
    } else {
        Ok(resized)
    }
}

/// Full-frame alpha layer: resize, feather, then invert if requested.
///
/// Each output value is how much of the edited image shows through at that pixel.
pub fn alpha_layer(mask: &GrayImage, width: u32, height: u32, meta: &MaskMeta) -> Result<GrayImage> {
    meta.validate()?;
    let resized = resize_to(mask, width, height)?;
    let feathered = GaussianBlurPreprocessor { sigma: meta.feather_radius }.preprocess(&resized)?;
    if meta.invert {
        InvertPreprocessor.preprocess(&feathered)
    } else {
        Ok(feathered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_mask() -> GrayImage {
        let mut img = GrayImage::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    #[test]
    fn test_alpha_layer_matches_target_size() {
        let alpha = alpha_layer(&square_mask(), 80, 60, &MaskMeta::default()).unwrap();
        assert_eq!(alpha.dimensions(), (80, 60));
        assert!(alpha.get_pixel(40, 30).0[0] >= 250);
        assert_eq!(alpha.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn test_feather_creates_gradient_band() {
        let meta = MaskMeta { invert: false, feather_radius: 3.0 };
        let alpha = alpha_layer(&square_mask(), 40, 40, &meta).unwrap();
        let edge = alpha.get_pixel(10, 20).0[0];
        assert!(edge > 0 && edge < 255, "edge value {edge} should be partial");
        assert_eq!(alpha.get_pixel(0, 0).0[0], 0);
        assert_eq!(alpha.get_pixel(20, 20).0[0], 255);
    }

    #[test]
    fn test_feathered_interior_is_fully_opaque() {
        let mut mask = GrayImage::new(120, 120);
        for y in 20..100 {
            for x in 20..100 {
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
        let meta = MaskMeta { invert: false, feather_radius: 5.0 };
        let alpha = alpha_layer(&mask, 120, 120, &meta).unwrap();
        for y in 40..80 {
            for x in 40..80 {
                assert_eq!(alpha.get_pixel(x, y).0[0], 255, "interior ({x},{y}) dimmed");
            }
        }
        assert_eq!(alpha.get_pixel(0, 60).0[0], 0);
    }

    #[test]
    fn test_invert_is_complement() {
        let plain = alpha_layer(&square_mask(), 40, 40, &MaskMeta { invert: false, feather_radius: 0.0 }).unwrap();
        let inverted = alpha_layer(&square_mask(), 40, 40, &MaskMeta { invert: true, feather_radius: 0.0 }).unwrap();
        for (a, b) in plain.pixels().zip(inverted.pixels()) {
            assert_eq!(a.0[0] as u16 + b.0[0] as u16, 255);
        }
    }

    #[test]
    fn test_canonical_mask_inverts_without_feather() {
        let canonical = canonical_mask(&square_mask(), 40, 40, true).unwrap();
        assert_eq!(canonical.get_pixel(20, 20).0[0], 0);
        assert_eq!(canonical.get_pixel(0, 0).0[0], 255);
    }
}
