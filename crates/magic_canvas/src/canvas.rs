use std::sync::Arc;

use gemini_client::{EditBackend, InlineImage};
use image::{ColorType, DynamicImage, GrayImage, imageops};
use mask::{CropRect, DetectedRegion, MaskMeta, RegionPipeline, feather_extent};

use crate::{
    compositor::{composite_masked, composite_whole},
    config::{CanvasConfig, CropConfig, PayloadConfig},
    error::{CanvasError, Result},
    invoker::{EditInvoker, EditPayload},
    payload::{decode_base, encode_mask_for, encode_png, encode_primary, payload_dimensions},
    request::{EditRequest, EditResult},
};

/// The masked edit pipeline.
///
/// Holds no per-request state; one instance can serve concurrent edits.
pub struct MagicCanvas<B> {
    invoker: EditInvoker<B>,
    region: Arc<RegionPipeline>,
    crop: CropConfig,
    payload: PayloadConfig,
}

/// Decoded inputs plus what will be sent to the remote service.
struct Prepared {
    base: DynamicImage,
    payload: EditPayload,
    masked: Option<MaskedPlan>,
}

struct MaskedPlan {
    /// Canonical mask at base size, already inverted if requested.
    mask: GrayImage,
    region: DetectedRegion,
    crop: CropRect,
    feather: f32,
}

impl<B: EditBackend> MagicCanvas<B> {
    pub fn new(backend: B, config: &CanvasConfig) -> Self {
        Self {
            invoker: EditInvoker::new(
                backend,
                config.retry,
                config.remote.temperature,
                config.remote.timeout(),
            ),
            region: Arc::new(config.region.pipeline()),
            crop: config.crop,
            payload: config.payload,
        }
    }

    pub fn backend(&self) -> &B {
        self.invoker.backend()
    }

    /// Run one edit end to end.
    ///
    /// An empty mask fails with [`CanvasError::NothingPainted`] before the
    /// remote service is contacted.
    #[tracing::instrument(level = "info", skip_all, fields(masked = request.mask.is_some()))]
    pub async fn edit(&self, request: EditRequest) -> Result<EditResult> {
        let instruction = request.instruction.trim().to_string();
        if instruction.is_empty() {
            return Err(CanvasError::MissingInstruction);
        }
        request.mask_meta.validate()?;
        tracing::info!(bytes = request.base_image.len(), mime = %request.base_mime, "edit requested");

        let region = Arc::clone(&self.region);
        let (crop, payload) = (self.crop, self.payload);
        let prepared = run_blocking(move || prepare(request, instruction, &region, &crop, &payload)).await?;

        let edited = self.invoker.invoke(&prepared.payload).await?;

        let result = run_blocking(move || finish(prepared, edited)).await?;
        tracing::info!(
            width = result.width,
            height = result.height,
            bytes = result.png.len(),
            crop = ?result.crop,
            "edit complete"
        );
        Ok(result)
    }

    /// Locate the region a mask would edit, without calling the remote service.
    pub fn plan(&self, base: &[u8], base_mime: &str, mask: &[u8], meta: MaskMeta) -> Result<(DetectedRegion, CropRect)> {
        meta.validate()?;
        let base = decode_base(base, base_mime)?;
        let plan = plan_mask(&base, mask, meta, &self.region, &self.crop)?;
        Ok((plan.region, plan.crop))
    }
}

/// Locate the region a mask would edit and the crop that would be sent,
/// without a remote service.
pub fn plan_region(
    config: &CanvasConfig,
    base: &[u8],
    base_mime: &str,
    mask: &[u8],
    meta: MaskMeta,
) -> Result<(DetectedRegion, CropRect)> {
    meta.validate()?;
    let base = decode_base(base, base_mime)?;
    let plan = plan_mask(&base, mask, meta, &config.region.pipeline(), &config.crop)?;
    Ok((plan.region, plan.crop))
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CanvasError::Internal(format!("raster worker failed: {e}")))?
}

fn plan_mask(
    base: &DynamicImage,
    mask_bytes: &[u8],
    meta: MaskMeta,
    region: &RegionPipeline,
    crop: &CropConfig,
) -> Result<MaskedPlan> {
    let (width, height) = (base.width(), base.height());
    if meta.feather_radius > width.max(height) as f32 {
        return Err(CanvasError::InvalidFeather(meta.feather_radius));
    }
    let raw = mask::decode_mask(mask_bytes).map_err(|e| CanvasError::MalformedMask(e.to_string()))?;
    if raw.width() == 0 || raw.height() == 0 {
        return Err(CanvasError::MalformedMask(format!("empty {}x{} raster", raw.width(), raw.height())));
    }
    let canonical = mask::canonical_mask(&raw, width, height, meta.invert)?;

    let Some(detected) = region.extract(&canonical, width, height)? else {
        tracing::info!(invert = meta.invert, feather = meta.feather_radius, "mask has nothing painted");
        return Err(CanvasError::NothingPainted);
    };

    let padding = if crop.feather_padding { feather_extent(meta.feather_radius) } else { 0 };
    let rect = crop.planner.plan_with_padding(&detected.bbox, width, height, padding)?;
    Ok(MaskedPlan {
        mask: canonical,
        region: detected,
        crop: rect,
        feather: meta.feather_radius,
    })
}

fn prepare(
    request: EditRequest,
    instruction: String,
    region: &RegionPipeline,
    crop: &CropConfig,
    config: &PayloadConfig,
) -> Result<Prepared> {
    let base = decode_base(&request.base_image, &request.base_mime)?;

    let Some(mask_bytes) = request.mask.as_deref() else {
        let image = encode_primary(&base, config)?;
        let payload = EditPayload { image, mask: None, instruction, invert: false, feather: 0.0 };
        return Ok(Prepared { base, payload, masked: None });
    };

    let plan = plan_mask(&base, mask_bytes, request.mask_meta, region, crop)?;
    let CropRect { left, top, width, height } = plan.crop;

    let base_piece = base.crop_imm(left, top, width, height);
    let mask_piece = imageops::crop_imm(&plan.mask, left, top, width, height).to_image();

    let image = encode_primary(&base_piece, config)?;
    let (sent_w, sent_h) = payload_dimensions(&image)?;
    let mask_payload: InlineImage = encode_mask_for(&mask_piece, sent_w, sent_h)?;
    tracing::debug!(crop = ?plan.crop, sent_w, sent_h, mime = %image.mime_type, "payload ready");

    // the mask is already canonical, so the prompt always describes white as editable
    let payload = EditPayload {
        image,
        mask: Some(mask_payload),
        instruction,
        invert: false,
        feather: plan.feather,
    };
    Ok(Prepared { base, payload, masked: Some(plan) })
}

fn finish(prepared: Prepared, edited: InlineImage) -> Result<EditResult> {
    let Prepared { base, masked, .. } = prepared;
    let (width, height) = (base.width(), base.height());
    let output = image::load_from_memory(&edited.bytes).map_err(|e| CanvasError::UnusableOutput(e.to_string()))?;

    let (composited, region, crop) = match masked {
        Some(plan) => {
            let meta = MaskMeta { invert: false, feather_radius: plan.feather };
            let out = composite_masked(&base, &output, &plan.mask, Some(plan.crop), &meta)?;
            (out, Some(plan.region.bbox), Some(plan.crop))
        }
        None => (composite_whole(&output, width, height), None, None),
    };

    let encoded = encode_png(&match_layout(DynamicImage::ImageRgba8(composited), base.color()))?;

    let mut result = EditResult::png(encoded, width, height);
    result.region = region;
    result.crop = crop;
    Ok(result)
}

/// Narrow the composited RGBA frame back to the base image's channel layout.
fn match_layout(img: DynamicImage, base: ColorType) -> DynamicImage {
    match base {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(img.to_luma8()),
        ColorType::La8 | ColorType::La16 => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        c if c.has_alpha() => img,
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}
