//! # Mask Region Library
//!
//! Raster analysis for painted edit masks: decoding, locating the dominant
//! editable region, planning the crop sent to a remote editor, and deriving
//! the feathered alpha layer used when compositing the edit back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask::{CropPlanner, RegionPipeline, decode_mask};
//!
//! let bytes = std::fs::read("mask.png")?;
//! let mask = decode_mask(&bytes)?;
//!
//! // Downscale to 256px, threshold, keep the largest component
//! let pipeline = RegionPipeline::default();
//! if let Some(region) = pipeline.extract(&mask, 2048, 1536)? {
//!     let crop = CropPlanner::default().plan(&region.bbox, 2048, 1536)?;
//!     println!("edit {:?} inside {:?}", region.bbox, crop);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use mask::{RegionPipeline, algorithms::*};
//!
//! let pipeline = RegionPipeline::builder()
//!     .add_preprocessor(GaussianBlurPreprocessor { sigma: 1.0 })
//!     .with_working_resolution(128)
//!     .with_threshold(64)
//!     .set_detector(LargestComponentDetector)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{MaskError, Result};
pub use types::{BoundingBox, CropRect, DetectedRegion, MAX_FEATHER_RADIUS, MaskMeta};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{RegionPipeline, builder::RegionPipelineBuilder};
pub use io::*;
