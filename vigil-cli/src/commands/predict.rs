//! Predict command implementation.
//!
//! Models live only in process memory, so a prediction trains on the
//! dataset first. Cached features make repeated runs cheap.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use tracing::info;

use crate::utils::{build_service, format_percent, require_file};
use crate::{OutputFormat, PipelineArgs};

/// Execute the predict command.
pub fn execute(
    video: &Path,
    args: &PipelineArgs,
    format: OutputFormat,
    mock: bool,
    quiet: bool,
) -> Result<()> {
    require_file(video)?;
    let service = build_service(args, mock)?;

    if !quiet && format == OutputFormat::Text {
        eprintln!(
            "{}",
            format!("Training on {} ...", args.dataset.display()).dimmed()
        );
    }
    let report = service.train().context("Training failed")?;

    info!(path = %video.display(), "Classifying");
    let prediction = service
        .predict_path(video)
        .with_context(|| format!("Prediction failed for {}", video.display()))?;

    match format {
        OutputFormat::Json => {
            let body = json!({
                "prediction": prediction.label,
                "confidence": prediction.confidence,
                "accuracy": report.accuracy,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).context("Failed to serialize prediction")?
            );
        }
        OutputFormat::Text if quiet => println!("{}", prediction.label),
        OutputFormat::Text => {
            let label = if prediction.label == vigil_core::LABEL_SOBER {
                prediction.label.to_uppercase().green().bold()
            } else {
                prediction.label.to_uppercase().red().bold()
            };
            println!();
            println!("   {} {}", "Prediction:".dimmed(), label);
            println!(
                "   {} {}",
                "Confidence:".dimmed(),
                format_percent(prediction.confidence)
            );
            println!(
                "   {} {}",
                "Model accuracy:".dimmed(),
                format_percent(report.accuracy)
            );
        }
    }

    Ok(())
}
