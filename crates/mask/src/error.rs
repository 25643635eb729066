use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Feather radius must be a finite, non-negative number, got {0}")]
    InvalidFeather(f32),
}

pub type Result<T> = std::result::Result<T, MaskError>;
