//! Pipeline configuration.
//!
//! Everything here has a default matching the reference sizing: 32×32
//! grayscale frames, ~50 samples per video, an 80/20 split seeded with 42.

use serde::{Deserialize, Serialize};

/// Default frame edge length after normalization.
pub const DEFAULT_FRAME_SIZE: u32 = 32;

/// Default number of frames the sampler aims to keep per video.
pub const DEFAULT_TARGET_SAMPLES: u64 = 50;

/// Default seed for the train/evaluation split and the forest.
pub const DEFAULT_SEED: u64 = 42;

/// Geometry of a normalized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of scalar values in one flattened frame.
    pub const fn len(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SIZE, DEFAULT_FRAME_SIZE)
    }
}

/// Tunables for the whole train/predict pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Normalized frame size
    pub geometry: FrameGeometry,
    /// Approximate number of frames kept per video
    pub target_samples: u64,
    /// Fraction of the dataset held out for evaluation
    pub test_fraction: f64,
    /// Seed shared by the split and the classifier
    pub seed: u64,
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Optional depth limit for each tree
    pub max_depth: Option<usize>,
    /// File extensions (lowercase, no dot) recognized as videos
    pub video_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            target_samples: DEFAULT_TARGET_SAMPLES,
            test_fraction: 0.2,
            seed: DEFAULT_SEED,
            n_trees: 100,
            max_depth: None,
            video_extensions: vec!["mp4".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Whether `ext` (case-insensitive, without the dot) is a recognized video extension.
    pub fn is_video_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.video_extensions.iter().any(|e| *e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_is_1024() {
        assert_eq!(FrameGeometry::default().len(), 1024);
    }

    #[test]
    fn test_video_extension_case_insensitive() {
        let config = PipelineConfig::default();
        assert!(config.is_video_extension("mp4"));
        assert!(config.is_video_extension("MP4"));
        assert!(!config.is_video_extension("mov"));
    }
}
