use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Mime type assumed for an inline image the service does not label.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Raw image bytes with their mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl InlineImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { bytes, mime_type: mime_type.into() }
    }
}

/// One generation call: instruction text followed by images, in order.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub images: Vec<InlineImage>,
    pub temperature: f32,
}

/// A decoded response part.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Image(InlineImage),
    Text(String),
    /// Anything else the service sends (thoughts, function calls, empty parts).
    NoUsablePart,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    pub parts: Vec<ResponsePart>,
    pub finish_reason: Option<String>,
}

impl GenerateResponse {
    /// First image part, if the model produced one.
    pub fn into_first_image(self) -> Option<InlineImage> {
        self.parts.into_iter().find_map(|part| match part {
            ResponsePart::Image(image) => Some(image),
            _ => None,
        })
    }

    /// Concatenated text parts, useful when no image came back.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Wire format of `models/{model}:generateContent`

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRequest {
    pub contents: Vec<WireContent>,
    pub generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<WireBlob>,
    #[serde(default, skip_serializing)]
    pub thought: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBlob {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGenerationConfig {
    pub response_modalities: Vec<&'static str>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireResponse {
    #[serde(default)]
    pub candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCandidate {
    #[serde(default)]
    pub content: Option<WireContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl From<&GenerateRequest> for WireRequest {
    fn from(request: &GenerateRequest) -> Self {
        let mut parts = Vec::with_capacity(request.images.len() + 1);
        parts.push(WirePart {
            text: Some(request.prompt.clone()),
            ..Default::default()
        });
        parts.extend(request.images.iter().map(|image| WirePart {
            inline_data: Some(WireBlob {
                mime_type: Some(image.mime_type.clone()),
                data: STANDARD.encode(&image.bytes),
            }),
            ..Default::default()
        }));

        Self {
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: WireGenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
                temperature: request.temperature,
            },
        }
    }
}

impl TryFrom<WirePart> for ResponsePart {
    type Error = BackendError;

    fn try_from(part: WirePart) -> Result<Self> {
        if part.thought == Some(true) {
            return Ok(Self::NoUsablePart);
        }
        if let Some(blob) = part.inline_data.filter(|b| !b.data.is_empty()) {
            let bytes = STANDARD
                .decode(blob.data.as_bytes())
                .map_err(|e| BackendError::Decode(format!("inline image is not valid base64: {e}")))?;
            let mime_type = blob
                .mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
            return Ok(Self::Image(InlineImage { bytes, mime_type }));
        }
        match part.text {
            Some(text) => Ok(Self::Text(text)),
            None => Ok(Self::NoUsablePart),
        }
    }
}

impl TryFrom<WireResponse> for GenerateResponse {
    type Error = BackendError;

    /// Only the first candidate is considered.
    fn try_from(wire: WireResponse) -> Result<Self> {
        let Some(candidate) = wire.candidates.into_iter().next() else {
            return Ok(Self::default());
        };
        let parts = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .map(ResponsePart::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parts,
            finish_reason: candidate.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> GenerateResponse {
        let wire: WireResponse = serde_json::from_str(json).unwrap();
        GenerateResponse::try_from(wire).unwrap()
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateRequest {
            prompt: "make it blue".to_string(),
            images: vec![
                InlineImage::new(vec![1, 2, 3], "image/png"),
                InlineImage::new(vec![4], "image/png"),
            ],
            temperature: 0.1,
        };
        let value = serde_json::to_value(WireRequest::from(&request)).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "make it blue");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AQID");
        assert!(parts[1].get("text").is_none());
        assert_eq!(parts.as_array().unwrap().len(), 3);
        assert_eq!(value["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_first_image_part_is_found_after_text() {
        let response = decode(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/jpeg","data":"AQID"}},
                {"inlineData":{"mimeType":"image/png","data":"BA=="}}
            ]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(response.text(), "Here you go");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        let image = response.into_first_image().unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_missing_mime_defaults_to_png() {
        let response = decode(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AQID"}}]}}]}"#);
        assert_eq!(response.into_first_image().unwrap().mime_type, DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn test_text_only_and_empty_responses_have_no_image() {
        assert!(decode(r#"{"candidates":[{"content":{"parts":[{"text":"I can't do that"}]}}]}"#)
            .into_first_image()
            .is_none());
        assert!(decode(r#"{"candidates":[]}"#).into_first_image().is_none());
        assert!(decode(r#"{}"#).into_first_image().is_none());
        assert!(decode(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).into_first_image().is_none());
    }

    #[test]
    fn test_thought_parts_are_unusable() {
        let response = decode(r#"{"candidates":[{"content":{"parts":[{"text":"hmm","thought":true}]}}]}"#);
        assert_eq!(response.parts, vec![ResponsePart::NoUsablePart]);
    }

    #[test]
    fn test_bad_base64_is_decode_error() {
        let wire: WireResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"!!!"}}]}}]}"#,
        )
        .unwrap();
        assert!(matches!(GenerateResponse::try_from(wire), Err(BackendError::Decode(_))));
    }
}
