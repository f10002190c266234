//! Mock decoder for testing.
//!
//! A mock "video" is a JSON file describing a clip of solid-color frames, so
//! tests can build datasets and uploads without real media or FFmpeg.
//! WARNING: Do not use in production.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::{FrameStream, VideoDecoder};
use crate::error::{Result, VigilError};

/// Description of a synthetic clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockClip {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// One RGB fill color per frame
    pub frames: Vec<[u8; 3]>,
    /// Frame count reported by the "container" (defaults to `frames.len()`)
    #[serde(default)]
    pub advertised_frames: Option<u64>,
    /// Index of the first frame that fails to decode
    #[serde(default)]
    pub fail_at: Option<usize>,
}

impl MockClip {
    /// Clip of `count` identical gray frames.
    pub fn gray(width: u32, height: u32, level: u8, count: usize) -> Self {
        Self {
            width,
            height,
            frames: vec![[level, level, level]; count],
            advertised_frames: None,
            fail_at: None,
        }
    }

    /// Clip whose frames are gray levels taken from `levels`.
    pub fn gray_sequence(width: u32, height: u32, levels: &[u8]) -> Self {
        Self {
            width,
            height,
            frames: levels.iter().map(|&l| [l, l, l]).collect(),
            advertised_frames: None,
            fail_at: None,
        }
    }

    /// Override the advertised frame count.
    pub fn with_advertised_frames(mut self, count: u64) -> Self {
        self.advertised_frames = Some(count);
        self
    }

    /// Make decoding fail at frame `index`.
    pub fn with_failure_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Serialize to the on-disk representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing plain data into a Vec cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Write the clip to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

/// Decoder that understands [`MockClip`] files.
#[derive(Debug, Default)]
pub struct MockDecoder {
    opens: AtomicUsize,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl VideoDecoder for MockDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
        if !path.is_file() {
            return Err(VigilError::SourceUnavailable(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let clip: MockClip = serde_json::from_slice(&bytes).map_err(|e| {
            VigilError::Decode(format!("Unreadable mock clip {}: {}", path.display(), e))
        })?;

        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockFrameStream { clip, position: 0 }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct MockFrameStream {
    clip: MockClip,
    position: usize,
}

impl FrameStream for MockFrameStream {
    fn frame_count(&self) -> Option<u64> {
        self.clip
            .advertised_frames
            .or(Some(self.clip.frames.len() as u64))
    }

    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.clip.fail_at.is_some_and(|at| self.position >= at) {
            return None;
        }
        let color = *self.clip.frames.get(self.position)?;
        self.position += 1;
        Some(RgbImage::from_pixel(
            self.clip.width,
            self.clip.height,
            Rgb(color),
        ))
    }
}
