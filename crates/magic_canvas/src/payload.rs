use std::io::Cursor;

use gemini_client::InlineImage;
use image::{
    DynamicImage, GrayImage, ImageDecoder, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder,
    imageops::FilterType, metadata::Orientation,
};
use mask::{encode_mask_png, fit_within};

use crate::{config::PayloadConfig, error::{CanvasError, Result}};

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

const HEIC_MESSAGE: &str = "Unsupported image format (HEIC). Please convert to JPG/PNG and retry.";

/// Decode the base image upright, rejecting HEIC up front with an actionable
/// message.
///
/// EXIF orientation is applied so the pixels match what the person painted
/// over; an unreadable orientation tag is ignored.
pub fn decode_base(bytes: &[u8], declared_mime: &str) -> Result<DynamicImage> {
    if is_heic(bytes, declared_mime) {
        return Err(CanvasError::MalformedImage(HEIC_MESSAGE.to_string()));
    }
    let img = decode_upright(bytes).map_err(|e| CanvasError::MalformedImage(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(CanvasError::MalformedImage(format!(
            "unreadable dimensions {}x{}",
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

fn decode_upright(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn is_heic(bytes: &[u8], declared_mime: &str) -> bool {
    let mime = declared_mime.to_ascii_lowercase();
    if mime.contains("heic") || mime.contains("heif") {
        return true;
    }
    // ISO-BMFF: box size, then "ftyp" and the major brand
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && matches!(&bytes[8..12], b"heic" | b"heix" | b"hevc" | b"heif" | b"mif1" | b"msf1")
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CanvasError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| CanvasError::Internal(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

/// Encode the primary image for upload.
///
/// PNG when it fits in `max_bytes`, otherwise JPEG down a ladder of shrinking
/// sizes and qualities until one fits; the last rung is used if none do.
pub fn encode_primary(img: &DynamicImage, config: &PayloadConfig) -> Result<InlineImage> {
    let png = encode_png(img)?;
    if png.len() <= config.max_bytes {
        return Ok(InlineImage::new(png, PNG_MIME));
    }

    let q = config.jpeg_quality;
    let side = config.max_side;
    let ladder = [
        (side, q),
        (side.min(960), q.min(78)),
        (side.min(896), q.min(74)),
        (side.min(768), q.min(70)),
        (side.min(640), q.min(62)),
    ];

    let mut last = Vec::new();
    for (max_side, quality) in ladder {
        let (w, h) = fit_within(img.width(), img.height(), max_side);
        let resized = if (w, h) == (img.width(), img.height()) {
            img.clone()
        } else {
            img.resize_exact(w, h, FilterType::Triangle)
        };
        last = encode_jpeg(&resized, quality)?;
        tracing::debug!(w, h, quality, bytes = last.len(), "re-encoded payload as JPEG");
        if last.len() <= config.max_bytes {
            break;
        }
    }
    Ok(InlineImage::new(last, JPEG_MIME))
}

/// Encode the mask at the same pixel size as the primary payload.
pub fn encode_mask_for(mask: &GrayImage, width: u32, height: u32) -> Result<InlineImage> {
    let sized = mask::resize_to(mask, width, height)?;
    Ok(InlineImage::new(encode_mask_png(&sized)?, PNG_MIME))
}

/// Pixel size of an encoded payload, as the remote service will see it.
pub fn payload_dimensions(payload: &InlineImage) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(&payload.bytes))
        .with_guessed_format()
        .map_err(|e| CanvasError::Internal(e.to_string()))?
        .into_dimensions()
        .map_err(|e| CanvasError::Internal(e.to_string()))
}
