//! Reconciles remote output with the original frame.
//!
//! The remote model may return a different size than it was sent and may
//! touch pixels it was told to protect. Compositing undoes both: the output is
//! resized back to where it belongs, masked by the feathered alpha layer, and
//! laid over the untouched base, so nothing outside the editable region changes.

use image::{DynamicImage, GrayImage, Rgba, RgbaImage, imageops::{self, FilterType}};
use mask::{CropRect, MaskMeta};

use crate::error::{CanvasError, Result};

/// Stretch `img` to exactly `width` x `height`, skipping the resample when
/// the size already matches.
pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    if (img.width(), img.height()) == (width, height) {
        img.to_rgba8()
    } else {
        imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
    }
}

/// No-mask path: the whole frame is the edit, normalised to base size and
/// full opacity.
pub fn composite_whole(edited: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let mut out = resize_exact(edited, width, height);
    for px in out.pixels_mut() {
        px.0[3] = 255;
    }
    out
}

/// Masked path: confine `edited` to the mask's editable region over `base`.
///
/// `edited` covers `crop` when one was used, otherwise the whole frame.
/// `mask` may be at any resolution; it is resized to the base.
#[tracing::instrument(level = "debug", skip_all, fields(w = base.width(), h = base.height(), crop = ?crop))]
pub fn composite_masked(
    base: &DynamicImage,
    edited: &DynamicImage,
    mask: &GrayImage,
    crop: Option<CropRect>,
    meta: &MaskMeta,
) -> Result<RgbaImage> {
    let (width, height) = (base.width(), base.height());
    let alpha = mask::alpha_layer(mask, width, height, meta)?;

    let mut layer = match crop {
        Some(rect) => {
            if !rect.fits(width, height) {
                tracing::error!(?rect, width, height, "crop rect outside frame");
                return Err(CanvasError::Internal(format!(
                    "crop {rect:?} does not fit a {width}x{height} frame"
                )));
            }
            let piece = resize_exact(edited, rect.width, rect.height);
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
            imageops::replace(&mut canvas, &piece, rect.left as i64, rect.top as i64);
            canvas
        }
        None => resize_exact(edited, width, height),
    };

    apply_dest_in(&mut layer, &alpha);

    let mut out = base.to_rgba8();
    for px in out.pixels_mut() {
        px.0[3] = 255;
    }
    blend_over(&mut out, &layer);
    Ok(out)
}

/// Scale each pixel's alpha by the matching mask value.
fn apply_dest_in(layer: &mut RgbaImage, alpha: &GrayImage) {
    for (px, a) in layer.pixels_mut().zip(alpha.pixels()) {
        px.0[3] = mul_div255(px.0[3], a.0[0]);
    }
}

/// Source-over onto an opaque destination. Zero-alpha pixels leave it untouched.
fn blend_over(dst: &mut RgbaImage, src: &RgbaImage) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        let a = s.0[3];
        match a {
            0 => {}
            255 => {
                d.0[..3].copy_from_slice(&s.0[..3]);
            }
            _ => {
                for c in 0..3 {
                    let v = s.0[c] as u32 * a as u32 + d.0[c] as u32 * (255 - a as u32);
                    d.0[c] = ((v + 127) / 255) as u8;
                }
            }
        }
    }
}

fn mul_div255(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}
