//! FFmpeg CLI decoder.
//!
//! `ffprobe` reads the stream header (dimensions and frame count), then
//! `ffmpeg` decodes to raw `rgb24` on stdout, one frame per
//! `width * height * 3` bytes.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{EmptyFrameStream, FrameStream, VideoDecoder};
use crate::error::{Result, VigilError};

/// Decoder backed by the `ffmpeg` and `ffprobe` binaries found in `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

/// Header information needed before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamHeader {
    width: u32,
    height: u32,
    frame_count: Option<u64>,
}

impl FfmpegDecoder {
    /// Locate `ffmpeg` and `ffprobe` in `PATH`.
    pub fn new() -> Result<Self> {
        let ffmpeg = which::which("ffmpeg")
            .map_err(|_| VigilError::DecoderUnavailable("ffmpeg not found in PATH".into()))?;
        let ffprobe = which::which("ffprobe")
            .map_err(|_| VigilError::DecoderUnavailable("ffprobe not found in PATH".into()))?;
        debug!(ffmpeg = %ffmpeg.display(), ffprobe = %ffprobe.display(), "Located FFmpeg tools");
        Ok(Self { ffmpeg, ffprobe })
    }

    /// Use explicit binary paths instead of searching `PATH`.
    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn probe(&self, path: &Path) -> Result<Option<StreamHeader>> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=width,height,nb_frames,nb_read_packets",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(VigilError::Decode(format!(
                "ffprobe could not read {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| VigilError::Decode(format!("Invalid ffprobe output: {}", e)))?;

        Ok(parse_header(probe))
    }
}

fn parse_header(probe: ProbeOutput) -> Option<StreamHeader> {
    let stream = probe.streams.into_iter().next()?;
    let width = stream.width.filter(|w| *w > 0)?;
    let height = stream.height.filter(|h| *h > 0)?;

    // Container metadata first, packet count as fallback
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| {
            stream
                .nb_read_packets
                .as_deref()
                .and_then(|n| n.parse::<u64>().ok())
        });

    Some(StreamHeader {
        width,
        height,
        frame_count,
    })
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
        if !path.is_file() {
            return Err(VigilError::SourceUnavailable(path.to_path_buf()));
        }

        let header = match self.probe(path)? {
            Some(header) if header.frame_count.unwrap_or(0) > 0 => header,
            other => {
                debug!(path = %path.display(), header = ?other, "No decodable video stream");
                return Ok(Box::new(EmptyFrameStream));
            }
        };

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-noautorotate", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VigilError::Decode("ffmpeg stdout was not captured".into()));
            }
        };

        Ok(Box::new(FfmpegFrameStream {
            child,
            stdout: BufReader::new(stdout),
            header,
            finished: false,
        }))
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Raw frame reader over a running `ffmpeg` process.
///
/// The child process is killed and reaped on drop.
struct FfmpegFrameStream {
    child: Child,
    stdout: BufReader<ChildStdout>,
    header: StreamHeader,
    finished: bool,
}

impl FrameStream for FfmpegFrameStream {
    fn frame_count(&self) -> Option<u64> {
        self.header.frame_count
    }

    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.finished {
            return None;
        }

        let frame_len = self.header.width as usize * self.header.height as usize * 3;
        let mut buf = vec![0u8; frame_len];
        if let Err(e) = self.stdout.read_exact(&mut buf) {
            if e.kind() != std::io::ErrorKind::UnexpectedEof {
                warn!(error = %e, "ffmpeg frame read failed, truncating stream");
            }
            self.finished = true;
            return None;
        }

        let frame = RgbImage::from_raw(self.header.width, self.header.height, buf);
        if frame.is_none() {
            self.finished = true;
        }
        frame
    }
}

impl Drop for FfmpegFrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_json(json: &str) -> ProbeOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_header_prefers_nb_frames() {
        let header = parse_header(probe_json(
            r#"{"streams":[{"width":640,"height":480,"nb_frames":"120","nb_read_packets":"118"}]}"#,
        ))
        .unwrap();
        assert_eq!(header.width, 640);
        assert_eq!(header.height, 480);
        assert_eq!(header.frame_count, Some(120));
    }

    #[test]
    fn test_parse_header_falls_back_to_packets() {
        let header = parse_header(probe_json(
            r#"{"streams":[{"width":320,"height":240,"nb_read_packets":"75"}]}"#,
        ))
        .unwrap();
        assert_eq!(header.frame_count, Some(75));
    }

    #[test]
    fn test_parse_header_no_streams() {
        assert!(parse_header(probe_json(r#"{"streams":[]}"#)).is_none());
        assert!(parse_header(probe_json(r#"{}"#)).is_none());
    }

    #[test]
    fn test_parse_header_zero_dimensions() {
        assert!(parse_header(probe_json(
            r#"{"streams":[{"width":0,"height":480,"nb_frames":"10"}]}"#
        ))
        .is_none());
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let decoder = FfmpegDecoder::with_binaries("ffmpeg", "ffprobe");
        let result = decoder.open(Path::new("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(VigilError::SourceUnavailable(_))));
    }
}
