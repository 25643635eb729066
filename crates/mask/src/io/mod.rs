use image::{DynamicImage, GrayImage, Luma};
use crate::error::Result;

/// Decode painted mask bytes into a single intensity channel.
///
/// Luminance is multiplied by alpha when present, so strokes exported on a
/// transparent layer read as protected wherever nothing was painted.
pub fn decode_mask(bytes: &[u8]) -> Result<GrayImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_mask(&img))
}

pub fn to_mask(img: &DynamicImage) -> GrayImage {
    if !img.color().has_alpha() {
        return img.to_luma8();
    }
    let la = img.to_luma_alpha8();
    GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let [l, a] = la.get_pixel(x, y).0;
        Luma([((l as u16 * a as u16 + 127) / 255) as u8])
    })
}

/// Encode a mask as 8-bit grayscale PNG.
pub fn encode_mask_png(mask: &GrayImage) -> Result<Vec<u8>> {
    let mut out = std::io::Cursor::new(Vec::new());
    mask.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}
