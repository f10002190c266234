//! Video decoding backends.
//!
//! Decoding is a black box to the rest of the pipeline: a [`VideoDecoder`]
//! opens a file and hands back a [`FrameStream`] that yields full-resolution
//! RGB frames in presentation order.
//!
//! ## Backends
//!
//! - **FFmpeg** - drives the `ffprobe`/`ffmpeg` command-line tools (feature `ffmpeg`)
//! - **Mock** - reads a small JSON clip description, for tests
//!
//! ## Resource handling
//!
//! A stream owns whatever handle the backend holds (child process, file
//! descriptor). Dropping the stream releases it, so callers get cleanup on
//! every exit path just by letting the stream go out of scope.

#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod mock;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegDecoder;
pub use mock::{MockClip, MockDecoder};

use std::path::Path;

use image::RgbImage;

use crate::error::Result;

/// Opens video files for frame-by-frame decoding.
///
/// Implementations must be thread-safe (`Send + Sync`): one decoder is shared
/// by every concurrent extraction.
pub trait VideoDecoder: Send + Sync {
    /// Open `path` for decoding.
    ///
    /// Returns `SourceUnavailable` when the file does not exist and `Decode`
    /// when the container cannot be read at all.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// A sequence of decoded frames from one open video.
pub trait FrameStream {
    /// Total frame count advertised by the container, if known.
    fn frame_count(&self) -> Option<u64>;

    /// Decode the next frame.
    ///
    /// Returns `None` at end of stream and on the first decode failure; a
    /// stream never yields frames after returning `None`.
    fn next_frame(&mut self) -> Option<RgbImage>;
}

/// Stream with no frames, for containers that advertise nothing to decode.
#[derive(Debug, Default)]
pub struct EmptyFrameStream;

impl FrameStream for EmptyFrameStream {
    fn frame_count(&self) -> Option<u64> {
        None
    }

    fn next_frame(&mut self) -> Option<RgbImage> {
        None
    }
}
