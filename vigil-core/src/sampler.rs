//! Deterministic frame sampling.
//!
//! # Algorithm
//!
//! Given a video advertising `T` frames, keep every `stride`-th frame where
//! `stride = max(1, T / target)`, starting at frame 0. Long videos therefore
//! contribute roughly `target` samples and short ones contribute every frame.
//! Decoding stops at end of stream or at the first frame that fails to
//! decode; what was sampled up to that point is kept.
//!
//! Every kept frame is converted to luma, resized to the configured geometry
//! and flattened row-major.

use std::path::Path;
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use tracing::debug;

use crate::config::{FrameGeometry, DEFAULT_TARGET_SAMPLES};
use crate::decoder::VideoDecoder;
use crate::error::Result;

/// One normalized frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledFrame {
    /// 0-based index of the frame in the source video
    pub index: u64,
    /// Grayscale intensities, row-major, `geometry.len()` long
    pub pixels: Vec<u8>,
}

/// Compute the sampling stride for a video with `total_frames` frames.
pub fn sample_stride(total_frames: u64, target_samples: u64) -> u64 {
    (total_frames / target_samples.max(1)).max(1)
}

/// Convert a decoded frame to a flattened grayscale buffer of `geometry`.
pub fn normalize_frame(frame: RgbImage, geometry: FrameGeometry) -> Vec<u8> {
    let gray = DynamicImage::ImageRgb8(frame).into_luma8();
    if gray.dimensions() == (geometry.width, geometry.height) {
        return gray.into_raw();
    }
    image::imageops::resize(&gray, geometry.width, geometry.height, FilterType::Triangle)
        .into_raw()
}

/// Produces the deterministic frame subsequence of a video.
#[derive(Clone)]
pub struct FrameSampler {
    decoder: Arc<dyn VideoDecoder>,
    geometry: FrameGeometry,
    target_samples: u64,
}

impl FrameSampler {
    pub fn new(decoder: Arc<dyn VideoDecoder>, geometry: FrameGeometry) -> Self {
        Self {
            decoder,
            geometry,
            target_samples: DEFAULT_TARGET_SAMPLES,
        }
    }

    /// Set the approximate number of frames to keep per video.
    pub fn with_target_samples(mut self, target: u64) -> Self {
        self.target_samples = target.max(1);
        self
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Sample and normalize frames from the video at `path`.
    ///
    /// An unknown or zero frame count yields an empty sequence.
    pub fn sample(&self, path: &Path) -> Result<Vec<SampledFrame>> {
        // Dropping `stream` releases the decoder on every return path
        let mut stream = self.decoder.open(path)?;

        let total = match stream.frame_count() {
            Some(total) if total > 0 => total,
            _ => {
                debug!(path = %path.display(), "Frame count unavailable, nothing to sample");
                return Ok(Vec::new());
            }
        };

        let stride = sample_stride(total, self.target_samples);
        let mut frames = Vec::with_capacity((total / stride + 1) as usize);
        let mut index: u64 = 0;

        while let Some(frame) = stream.next_frame() {
            if index % stride == 0 {
                frames.push(SampledFrame {
                    index,
                    pixels: normalize_frame(frame, self.geometry),
                });
            }
            index += 1;
        }

        debug!(
            path = %path.display(),
            decoder = self.decoder.name(),
            total_frames = total,
            decoded_frames = index,
            stride,
            sampled = frames.len(),
            "Sampled video"
        );

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{MockClip, MockDecoder};
    use image::Rgb;
    use tempfile::TempDir;

    fn sampler() -> FrameSampler {
        FrameSampler::new(Arc::new(MockDecoder::new()), FrameGeometry::new(8, 8))
    }

    #[test]
    fn test_stride_short_video_samples_every_frame() {
        assert_eq!(sample_stride(0, 50), 1);
        assert_eq!(sample_stride(10, 50), 1);
        assert_eq!(sample_stride(49, 50), 1);
    }

    #[test]
    fn test_stride_long_video() {
        assert_eq!(sample_stride(50, 50), 1);
        assert_eq!(sample_stride(100, 50), 2);
        assert_eq!(sample_stride(149, 50), 2);
        assert_eq!(sample_stride(1000, 50), 20);
    }

    #[test]
    fn test_normalize_frame_dimensions() {
        let frame = RgbImage::from_pixel(64, 48, Rgb([200, 200, 200]));
        let pixels = normalize_frame(frame, FrameGeometry::new(32, 32));
        assert_eq!(pixels.len(), 1024);
        assert!(pixels.iter().all(|&p| p == 200));
    }

    #[test]
    fn test_normalize_frame_uses_luma() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let pixels = normalize_frame(frame, FrameGeometry::new(4, 4));
        // Pure red is darker than white and brighter than black in luma
        assert!(pixels[0] > 0 && pixels[0] < 255);
    }

    #[test]
    fn test_sample_keeps_stride_multiples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.mp4");
        let levels: Vec<u8> = (0..100).map(|i| i as u8).collect();
        MockClip::gray_sequence(8, 8, &levels)
            .write_to(&path)
            .unwrap();

        let frames = sampler().sample(&path).unwrap();
        assert_eq!(frames.len(), 50);
        let indices: Vec<u64> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices[..4], [0, 2, 4, 6]);
        assert_eq!(frames[3].pixels[0], 6);
    }

    #[test]
    fn test_sample_zero_advertised_frames_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.mp4");
        MockClip::gray(8, 8, 50, 5)
            .with_advertised_frames(0)
            .write_to(&path)
            .unwrap();

        assert!(sampler().sample(&path).unwrap().is_empty());
    }

    #[test]
    fn test_sample_truncates_on_decode_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.mp4");
        MockClip::gray(8, 8, 50, 20)
            .with_failure_at(5)
            .write_to(&path)
            .unwrap();

        let frames = sampler().sample(&path).unwrap();
        assert_eq!(frames.len(), 5);
    }
}
