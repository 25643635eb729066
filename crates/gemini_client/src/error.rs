use serde::Deserialize;
use thiserror::Error;

/// Failures from a call to the generative image service.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The service rejected the payload as malformed or unsupported.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP {code} ({}): {message}", .status.as_deref().unwrap_or("unknown"))]
    Status {
        code: u16,
        status: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

impl BackendError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Classify a non-success HTTP response.
    ///
    /// The structured `error.status` field decides. Bodies that are not the
    /// usual error envelope fall back to a substring check.
    pub fn from_http(code: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => {
                let message = error.message.unwrap_or_default();
                if error.status.as_deref() == Some("INVALID_ARGUMENT") {
                    Self::InvalidArgument(message)
                } else {
                    Self::Status { code, status: error.status, message }
                }
            }
            Err(_) if body.contains("INVALID_ARGUMENT") => Self::InvalidArgument(truncate(body, 512)),
            Err(_) => Self::Status { code, status: None, message: truncate(body, 512) },
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
