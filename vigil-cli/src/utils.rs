//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::warn;
use vigil_core::{
    ClassificationService, FeatureExtractor, FrameSampler, MockDecoder, PipelineConfig,
    VideoDecoder,
};

use crate::PipelineArgs;

/// Pick the decoder backend: mock clips for tests, FFmpeg otherwise.
pub fn decoder(mock: bool) -> Result<Arc<dyn VideoDecoder>> {
    if mock {
        warn!("Using MOCK decoder (videos are JSON clip descriptions)");
        return Ok(Arc::new(MockDecoder::new()));
    }

    let ffmpeg = vigil_core::FfmpegDecoder::new().context("Cannot decode videos")?;
    Ok(Arc::new(ffmpeg))
}

/// Build a service over the dataset and cache named in `args`.
pub fn build_service(args: &PipelineArgs, mock: bool) -> Result<ClassificationService> {
    Ok(ClassificationService::new(
        args.pipeline_config(),
        decoder(mock)?,
        &args.dataset,
        &args.cache,
    ))
}

/// Build a standalone extractor with default settings.
pub fn build_extractor(mock: bool) -> Result<FeatureExtractor> {
    let config = PipelineConfig::default();
    let sampler = FrameSampler::new(decoder(mock)?, config.geometry)
        .with_target_samples(config.target_samples);
    Ok(FeatureExtractor::new(sampler))
}

/// Fail early with a readable message if `path` is not a file.
pub fn require_file(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(())
}

/// Format a ratio in [0, 1] as a percentage.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Format a timestamp as a human-readable UTC string.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
