//! Train command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;
use vigil_core::TrainingReport;

use crate::utils::{build_service, format_percent, format_timestamp};
use crate::{OutputFormat, PipelineArgs};

/// Execute the train command.
pub fn execute(args: &PipelineArgs, format: OutputFormat, mock: bool, quiet: bool) -> Result<()> {
    let service = build_service(args, mock)?;

    info!(dataset = %args.dataset.display(), cache = %args.cache.display(), "Training");
    let report = service.train().context("Training failed")?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
        OutputFormat::Text if quiet => println!("{:.4}", report.accuracy),
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

/// Human-readable training summary.
pub fn print_report(report: &TrainingReport) {
    println!();
    println!("{}", report.message.green().bold());
    println!();
    println!(
        "   {} {}",
        "Accuracy:".dimmed(),
        format_percent(report.accuracy).bold()
    );
    println!(
        "   {} {} of {}",
        "Videos:".dimmed(),
        report.processed_videos,
        report.total_videos
    );
    println!(
        "   {} {} train / {} held out",
        "Split:".dimmed(),
        report.train_size,
        report.test_size
    );
    if report.held_out_classes < 2 {
        println!(
            "   {} {}",
            "Note:".dimmed(),
            "held-out videos cover a single class".yellow()
        );
    }
    println!(
        "   {} {}",
        "Trained at:".dimmed(),
        format_timestamp(report.trained_at)
    );

    if !report.failures.is_empty() {
        println!();
        println!(
            "   {} {}",
            "Skipped:".dimmed(),
            format!("{} unreadable video(s)", report.failed_videos).yellow()
        );
        for failure in &report.failures {
            println!("     {} {}", "-".dimmed(), failure.identity);
        }
    }
}
