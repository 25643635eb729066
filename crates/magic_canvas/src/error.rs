use gemini_client::BackendError;
use strum::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Malformed image: {0}")]
    MalformedImage(String),

    #[error("Malformed mask: {0}")]
    MalformedMask(String),

    #[error("Missing edit instruction")]
    MissingInstruction,

    #[error("Feather radius must be a finite, non-negative number, got {0}")]
    InvalidFeather(f32),

    #[error("Nothing painted: the mask has no editable region")]
    NothingPainted,

    #[error("Remote service rejected the request: {0}")]
    RemoteInvalidArgument(String),

    #[error("Remote service returned no image (finish reason: {})", .finish_reason.as_deref().unwrap_or("none"))]
    NoImageProduced { finish_reason: Option<String> },

    #[error("Remote image could not be decoded: {0}")]
    UnusableOutput(String),

    #[error("Remote service error: {0}")]
    Remote(#[source] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CanvasError>;

/// Stable, matchable name for each failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    MalformedImage,
    MalformedMask,
    MissingInstruction,
    InvalidFeather,
    NothingPainted,
    RemoteInvalidArgument,
    NoImageProduced,
    UnusableOutput,
    Remote,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    Client,
    Server,
}

impl ErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            Self::MalformedImage
            | Self::MalformedMask
            | Self::MissingInstruction
            | Self::InvalidFeather
            | Self::NothingPainted
            | Self::RemoteInvalidArgument => ErrorClass::Client,
            Self::NoImageProduced | Self::UnusableOutput | Self::Remote | Self::Internal => ErrorClass::Server,
        }
    }

    /// HTTP status a handler should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NothingPainted => 422,
            Self::Internal => 500,
            _ if self.class() == ErrorClass::Client => 400,
            _ => 502,
        }
    }
}

impl CanvasError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedImage(_) => ErrorKind::MalformedImage,
            Self::MalformedMask(_) => ErrorKind::MalformedMask,
            Self::MissingInstruction => ErrorKind::MissingInstruction,
            Self::InvalidFeather(_) => ErrorKind::InvalidFeather,
            Self::NothingPainted => ErrorKind::NothingPainted,
            Self::RemoteInvalidArgument(_) => ErrorKind::RemoteInvalidArgument,
            Self::NoImageProduced { .. } => ErrorKind::NoImageProduced,
            Self::UnusableOutput(_) => ErrorKind::UnusableOutput,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Text safe to show the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedImage(detail) if detail.contains("HEIC") => detail.clone(),
            Self::MalformedImage(_) => "The image could not be read. Please upload a JPG or PNG.".to_string(),
            Self::MalformedMask(_) => "The mask could not be read. Please repaint the region and retry.".to_string(),
            Self::MissingInstruction => "Describe the edit you want before submitting.".to_string(),
            Self::InvalidFeather(_) => "Feather must be between zero and the size of the image, in pixels.".to_string(),
            Self::NothingPainted => "Nothing is painted on the mask. Paint the region you want to edit.".to_string(),
            Self::RemoteInvalidArgument(_) => {
                "The image was rejected by the editing service. Try a smaller JPG or PNG.".to_string()
            }
            Self::NoImageProduced { .. } | Self::UnusableOutput(_) | Self::Remote(_) | Self::Internal(_) => {
                "Could not complete the edit, please try again.".to_string()
            }
        }
    }

    pub(crate) fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::InvalidArgument(message) => Self::RemoteInvalidArgument(message),
            other => Self::Remote(other),
        }
    }
}

impl From<mask::MaskError> for CanvasError {
    fn from(err: mask::MaskError) -> Self {
        match err {
            mask::MaskError::InvalidFeather(radius) => Self::InvalidFeather(radius),
            mask::MaskError::ImageLoad(e) => Self::MalformedMask(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
