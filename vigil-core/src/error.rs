use std::path::PathBuf;

use thiserror::Error;

/// Version tag written into every persisted feature cache file.
pub const CURRENT_CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Training failed: {0}")]
    TrainingError(#[source] Box<VigilError>),

    #[error("Model not trained yet")]
    ModelNotTrained,

    #[error("Prediction failed: {0}")]
    PredictionError(#[source] Box<VigilError>),

    #[error("Video source unavailable: {0}")]
    SourceUnavailable(PathBuf),

    #[error("Video decoder unavailable: {0}")]
    DecoderUnavailable(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Feature cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VigilError {
    /// Wrap a failure raised while fitting or publishing a model.
    ///
    /// `InsufficientData` is passed through untouched so callers can tell
    /// "nothing to learn from" apart from a genuine training fault.
    pub fn training(cause: VigilError) -> Self {
        match cause {
            VigilError::InsufficientData(_) | VigilError::TrainingError(_) => cause,
            other => VigilError::TrainingError(Box::new(other)),
        }
    }

    /// Wrap a failure raised while extracting features for a prediction.
    pub fn prediction(cause: VigilError) -> Self {
        match cause {
            VigilError::ModelNotTrained | VigilError::PredictionError(_) => cause,
            other => VigilError::PredictionError(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, VigilError>;
