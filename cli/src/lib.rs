use magic_canvas::{CanvasConfig, EditRequest};
use mask::{MaskError, MaskMeta};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    MaskError(#[from] MaskError),
    #[error("API key not provided. Use --api-key or set {API_KEY_ENV}")]
    MissingApiKey,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One edit described in a job file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EditJob {
    pub name: String,
    /// Base image to edit.
    pub image: String,
    /// Painted mask; the whole image is edited when absent.
    pub mask: Option<String>,
    pub instruction: String,
    #[serde(default)]
    pub invert: bool,
    /// Edge feather in pixels.
    #[serde(default)]
    pub feather: f32,
    /// Where the PNG result is written.
    pub output: String,
}

impl EditJob {
    pub fn mask_meta(&self) -> Result<MaskMeta, CliError> {
        Ok(MaskMeta::new(self.invert, self.feather)?)
    }

    /// Read the referenced files into a pipeline request.
    pub fn to_request(&self) -> Result<EditRequest, CliError> {
        let request = EditRequest::new(fs::read(&self.image)?, mime_from_path(&self.image), &self.instruction);
        match &self.mask {
            Some(mask) => Ok(request.with_mask(fs::read(mask)?, self.mask_meta()?)),
            None => Ok(request),
        }
    }
}

/// Settings file: pipeline tuning plus an optional batch of edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CanvasFile {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub jobs: Vec<EditJob>,
}

impl CanvasFile {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save configuration, picking the format from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

/// `--api-key` wins over the environment.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String, CliError> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or(CliError::MissingApiKey)
}

/// Declared mime type for an input file, from its extension.
pub fn mime_from_path<P: AsRef<Path>>(path: P) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => "application/octet-stream",
    }
}
