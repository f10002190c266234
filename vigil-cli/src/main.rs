//! Vigil CLI - offline video impairment screening.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};
use vigil_core::{DEFAULT_SEED, PipelineConfig};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error
  65  Data error (not enough training data, undecodable video)
  66  Input file missing or unreadable
  69  Video decoder unavailable (ffmpeg/ffprobe not in PATH)
  74  I/O error (cache file could not be written)";

#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about = "Video impairment screening", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print only the essential result
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Read videos as JSON mock clips instead of decoding with FFmpeg (for testing)
    #[arg(long, global = true)]
    mock: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Clone, Debug)]
pub struct PipelineArgs {
    /// Directory holding the drunk/ and sober/ collections
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    dataset: PathBuf,

    /// Feature cache file
    #[arg(short, long, value_name = "FILE", default_value = "features_cache.cbor")]
    cache: PathBuf,

    /// Recognized video extensions
    #[arg(long, value_delimiter = ',', default_value = "mp4")]
    extensions: Vec<String>,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Seed for the train/test split and the forest
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl PipelineArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            n_trees: self.trees,
            seed: self.seed,
            video_extensions: self
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            ..PipelineConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features for the dataset and train the classifier
    Train {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Train on the dataset, then classify a video
    Predict {
        /// Path to the video to classify
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the feature vector of a single video
    Extract {
        /// Path to the video
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Output format (json prints the full vector)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Inspect or clear the feature cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache location and entry count
    Info {
        /// Feature cache file
        #[arg(short, long, value_name = "FILE", default_value = "features_cache.cbor")]
        cache: PathBuf,

        /// List every cached video
        #[arg(long)]
        list: bool,
    },

    /// Delete the cache file
    Clear {
        /// Feature cache file
        #[arg(short, long, value_name = "FILE", default_value = "features_cache.cbor")]
        cache: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "vigil_core=debug,vigil=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }
    init_tracing(cli.verbose);

    let quiet = cli.quiet;
    let mock = cli.mock;

    let result: Result<()> = match cli.command {
        Commands::Train { pipeline, format } => {
            commands::train::execute(&pipeline, format, mock, quiet)
        }
        Commands::Predict {
            video,
            pipeline,
            format,
        } => commands::predict::execute(&video, &pipeline, format, mock, quiet),
        Commands::Extract { video, format } => {
            commands::extract::execute(&video, format, mock, quiet)
        }
        Commands::Cache { action } => match action {
            CacheAction::Info { cache, list } => commands::cache::info(&cache, list, quiet),
            CacheAction::Clear { cache } => commands::cache::clear(&cache, quiet),
        },
    };

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
