//! Feature extraction.
//!
//! A video is summarized by the element-wise mean of its sampled, normalized
//! frames. The result always has `geometry.len()` entries; a video with no
//! decodable frames maps to the all-zero vector.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::FrameGeometry;
use crate::error::Result;
use crate::sampler::{FrameSampler, SampledFrame};

/// Fixed-length numeric summary of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// All-zero vector of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Element-wise mean of `frames`, or `None` when there are no frames.
    pub fn mean_of(frames: &[SampledFrame], len: usize) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }

        let mut sums = vec![0.0f64; len];
        for frame in frames {
            for (sum, &pixel) in sums.iter_mut().zip(frame.pixels.iter()) {
                *sum += f64::from(pixel);
            }
        }

        let count = frames.len() as f64;
        sums.iter_mut().for_each(|s| *s /= count);
        Some(Self(sums))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Whether every entry is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Reduces a video to a [`FeatureVector`].
#[derive(Clone)]
pub struct FeatureExtractor {
    sampler: FrameSampler,
}

impl FeatureExtractor {
    pub fn new(sampler: FrameSampler) -> Self {
        Self { sampler }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.sampler.geometry()
    }

    /// Length of every vector this extractor produces.
    pub fn feature_len(&self) -> usize {
        self.geometry().len()
    }

    /// Extract the feature vector of the video at `path`.
    pub fn extract(&self, path: &Path) -> Result<FeatureVector> {
        let frames = self.sampler.sample(path)?;
        let len = self.feature_len();
        Ok(FeatureVector::mean_of(&frames, len).unwrap_or_else(|| FeatureVector::zeros(len)))
    }
}
