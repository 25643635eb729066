//! # Gemini Client
//!
//! Thin typed client for the image-capable `generateContent` endpoint.
//! Callers depend on the [`EditBackend`] trait so the service can be swapped
//! for a scripted backend in tests.
//!
//! ```rust,no_run
//! use gemini_client::{ClientConfig, EditBackend, GeminiClient, GenerateRequest, InlineImage};
//!
//! # async fn run() -> gemini_client::Result<()> {
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY").unwrap_or_default(), ClientConfig::default())?;
//! let request = GenerateRequest {
//!     prompt: "Make the jacket red".to_string(),
//!     images: vec![InlineImage::new(std::fs::read("photo.png").unwrap(), "image/png")],
//!     temperature: 0.1,
//! };
//! let image = client.generate(&request).await?.into_first_image();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;

use std::{future::Future, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use error::{BackendError, Result};
pub use types::{GenerateRequest, GenerateResponse, InlineImage, ResponsePart, DEFAULT_IMAGE_MIME};

use types::{WireRequest, WireResponse};

/// Something that can turn instructions plus images into generated content.
pub trait EditBackend: Send + Sync {
    fn generate(&self, request: &GenerateRequest) -> impl Future<Output = Result<GenerateResponse>> + Send;
}

/// Connection settings for the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL up to and including the API version.
    pub api_base: String,
    /// Image-capable model name.
    pub model: String,
    /// Sampling temperature for edits.
    pub temperature: f32,
    /// Upper bound on a single request, in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base.trim_end_matches('/'), self.model)
    }
}

/// HTTP client bound to one API key and model.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    config: ClientConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(BackendError::Configuration("missing API key".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, api_key, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.config.timeout_secs)
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

impl EditBackend for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.config.endpoint();
        let body = WireRequest::from(request);
        tracing::debug!(
            model = %self.config.model,
            images = request.images.len(),
            prompt_chars = request.prompt.len(),
            "sending generateContent"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            let err = BackendError::from_http(status.as_u16(), &text);
            tracing::debug!(status = status.as_u16(), error = %err, "generateContent failed");
            return Err(err);
        }

        let wire: WireResponse = serde_json::from_str(&text)?;
        GenerateResponse::try_from(wire)
    }
}
