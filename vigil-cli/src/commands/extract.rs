//! Extract command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;

use crate::utils::{build_extractor, require_file};
use crate::OutputFormat;

/// Execute the extract command.
pub fn execute(video: &Path, format: OutputFormat, mock: bool, quiet: bool) -> Result<()> {
    require_file(video)?;
    let extractor = build_extractor(mock)?;

    let features = extractor
        .extract(video)
        .with_context(|| format!("Feature extraction failed for {}", video.display()))?;
    let values = features.as_slice();

    match format {
        OutputFormat::Json => {
            let body = json!({
                "video": video.display().to_string(),
                "width": extractor.geometry().width,
                "height": extractor.geometry().height,
                "features": values,
            });
            println!(
                "{}",
                serde_json::to_string(&body).context("Failed to serialize features")?
            );
        }
        OutputFormat::Text if quiet => println!("{}", values.len()),
        OutputFormat::Text => {
            let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            println!();
            println!("   {} {}", "Video:".dimmed(), video.display());
            println!(
                "   {} {} ({}x{} grayscale)",
                "Features:".dimmed(),
                values.len(),
                extractor.geometry().width,
                extractor.geometry().height
            );
            println!("   {} {:.2}", "Mean:".dimmed(), mean);
            println!("   {} {:.2} .. {:.2}", "Range:".dimmed(), min, max);
            if features.is_zero() {
                println!(
                    "   {} {}",
                    "Note:".dimmed(),
                    "no decodable frames, all-zero vector".yellow()
                );
            }
        }
    }

    Ok(())
}
