//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use vigil_core::VigilError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Data format error (not enough training data, undecodable video).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (FFmpeg tools missing).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first pipeline error in the chain
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<VigilError>())
            .map(classify)
            .unwrap_or_else(|| {
                if message.contains("Failed to read") {
                    INPUT_ERROR
                } else if message.contains("Failed to write") || message.contains("Failed to remove") {
                    IO_ERROR
                } else {
                    GENERAL_ERROR
                }
            });

        Self {
            code,
            message: Some(message),
        }
    }
}

fn classify(err: &VigilError) -> i32 {
    match err {
        VigilError::TrainingError(inner) | VigilError::PredictionError(inner) => classify(inner),
        VigilError::InsufficientData(_) | VigilError::Decode(_) => DATA_ERROR,
        VigilError::SourceUnavailable(_) => INPUT_ERROR,
        VigilError::DecoderUnavailable(_) => UNAVAILABLE,
        VigilError::CacheError(_) | VigilError::Io(_) => IO_ERROR,
        VigilError::UnknownLabel(_) | VigilError::ModelNotTrained | VigilError::Classifier(_) => {
            GENERAL_ERROR
        }
    }
}
