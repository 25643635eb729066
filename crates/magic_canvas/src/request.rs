use mask::{BoundingBox, CropRect, MaskMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::payload::PNG_MIME;

/// One masked (or whole-frame) edit of a base image.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub base_image: Vec<u8>,
    /// Mime type declared by the uploader; only consulted for the HEIC check.
    pub base_mime: String,
    pub instruction: String,
    /// Painted mask, white = editable unless `mask_meta.invert` is set.
    pub mask: Option<Vec<u8>>,
    pub mask_meta: MaskMeta,
}

impl EditRequest {
    pub fn new(base_image: Vec<u8>, base_mime: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            base_image,
            base_mime: base_mime.into(),
            instruction: instruction.into(),
            mask: None,
            mask_meta: MaskMeta::default(),
        }
    }

    pub fn with_mask(mut self, mask: Vec<u8>, meta: MaskMeta) -> Self {
        self.mask = Some(mask);
        self.mask_meta = meta;
        self
    }
}

/// Composited output, always PNG at the base image's size.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditResult {
    #[serde(skip)]
    pub png: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// Dominant painted region, in base-image pixels.
    pub region: Option<BoundingBox>,
    /// Sub-rectangle that was sent for editing.
    pub crop: Option<CropRect>,
}

impl EditResult {
    pub(crate) fn png(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            png,
            mime_type: PNG_MIME.to_string(),
            width,
            height,
            region: None,
            crop: None,
        }
    }
}
