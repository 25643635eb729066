//! # Magic Canvas
//!
//! Masked image editing on top of a generative image service that guarantees
//! neither the image size nor the untouched pixels. The painted mask is
//! reduced to its dominant region, a padded crop around it is sent for
//! editing, and the result is composited back so only the painted region
//! changes and the output matches the base image's dimensions.
//!
//! ```rust,no_run
//! use gemini_client::GeminiClient;
//! use magic_canvas::{CanvasConfig, EditRequest, MagicCanvas};
//! use mask::MaskMeta;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CanvasConfig::default();
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?, config.remote.clone())?;
//! let canvas = MagicCanvas::new(client, &config);
//!
//! let request = EditRequest::new(std::fs::read("photo.jpg")?, "image/jpeg", "make the sofa green")
//!     .with_mask(std::fs::read("mask.png")?, MaskMeta::new(false, 6.0)?);
//! let result = canvas.edit(request).await?;
//! std::fs::write("edited.png", &result.png)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod payload;
pub mod prompt;
pub mod invoker;
pub mod compositor;
pub mod request;
pub mod canvas;

pub use error::{CanvasError, ErrorClass, ErrorKind, Result};
pub use config::{CanvasConfig, CropConfig, PayloadConfig, RegionConfig, RetryPolicy, should_retry};
pub use invoker::{EditInvoker, EditPayload};
pub use compositor::{composite_masked, composite_whole};
pub use request::{EditRequest, EditResult};
pub use canvas::{MagicCanvas, plan_region};
pub use prompt::build_prompt;
