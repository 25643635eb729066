use crate::{
    pipeline::RegionPipeline,
    traits::{MaskPreprocessor, RegionDetector},
    algorithms::{
        DownscalePreprocessor,
        ThresholdPreprocessor,
        LargestComponentDetector,
        DEFAULT_ON_THRESHOLD,
        DEFAULT_WORKING_MAX_SIDE,
    },
};

/// Builder for region pipelines with a fluent API
pub struct RegionPipelineBuilder {
    preprocessors: Vec<Box<dyn MaskPreprocessor>>,
    detector: Option<Box<dyn RegionDetector>>,
}

impl RegionPipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            detector: None,
        }
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: MaskPreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the region detector (replaces any existing one)
    pub fn set_detector<D>(mut self, detector: D) -> Self
    where
        D: RegionDetector + 'static,
    {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Downscale so the longest side is at most `max_side`
    pub fn with_working_resolution(self, max_side: u32) -> Self {
        self.add_preprocessor(DownscalePreprocessor { max_side })
    }

    /// Binarize at `threshold`
    pub fn with_threshold(self, threshold: u8) -> Self {
        self.add_preprocessor(ThresholdPreprocessor { threshold })
    }

    /// Build the pipeline, defaulting to the largest-component detector
    pub fn build(self) -> RegionPipeline {
        let detector = self.detector
            .unwrap_or_else(|| Box::new(LargestComponentDetector));

        RegionPipeline::new(self.preprocessors, detector)
    }

    /// Downscale, threshold, largest component
    pub fn build_standard(working_max_side: u32, threshold: u8) -> RegionPipeline {
        Self::new()
            .with_working_resolution(working_max_side)
            .with_threshold(threshold)
            .build()
    }
}

impl Default for RegionPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RegionPipeline {
    fn default() -> Self {
        RegionPipelineBuilder::build_standard(DEFAULT_WORKING_MAX_SIDE, DEFAULT_ON_THRESHOLD)
    }
}
