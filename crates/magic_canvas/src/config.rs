use std::time::Duration;

use gemini_client::{BackendError, ClientConfig};
use mask::{CropPlanner, DEFAULT_ON_THRESHOLD, DEFAULT_WORKING_MAX_SIDE, RegionPipeline, RegionPipelineBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything tunable about an edit, grouped by pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CanvasConfig {
    pub remote: ClientConfig,
    pub retry: RetryPolicy,
    pub region: RegionConfig,
    pub crop: CropConfig,
    pub payload: PayloadConfig,
}

/// Retry behaviour for remote calls. Only invalid-argument failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Fixed pause before each retry, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1, delay_ms: 500 }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether a call that failed on attempt number `attempt` (1-based) gets another try.
    pub fn should_retry(&self, error: &BackendError, attempt: u32) -> bool {
        attempt <= self.max_retries && should_retry(error)
    }
}

/// Failure classes worth a second attempt.
pub fn should_retry(error: &BackendError) -> bool {
    error.is_invalid_argument()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RegionConfig {
    /// Longest side of the connected-component working grid.
    pub working_max_side: u32,
    /// Downscaled intensities at or below this are background.
    pub on_threshold: u8,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            working_max_side: DEFAULT_WORKING_MAX_SIDE,
            on_threshold: DEFAULT_ON_THRESHOLD,
        }
    }
}

impl RegionConfig {
    pub fn pipeline(&self) -> RegionPipeline {
        RegionPipelineBuilder::build_standard(self.working_max_side, self.on_threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CropConfig {
    #[serde(flatten)]
    pub planner: CropPlanner,
    /// Widen the margin so the whole feather band falls inside the crop.
    pub feather_padding: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            planner: CropPlanner::default(),
            feather_padding: true,
        }
    }
}

/// Limits on the image bytes sent to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PayloadConfig {
    /// PNG payloads above this size are re-encoded as JPEG.
    pub max_bytes: usize,
    /// Longest side of a re-encoded payload.
    pub max_side: u32,
    pub jpeg_quality: u8,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 3_500_000,
            max_side: 1024,
            jpeg_quality: 82,
        }
    }
}
