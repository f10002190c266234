//! Vigil Core - video impairment screening pipeline
//!
//! This crate turns short video clips into fixed-length feature vectors and
//! trains a binary classifier that labels a clip as `drunk` or `sober`.
//!
//! # Pipeline
//!
//! - [`FrameSampler`] picks ~50 evenly strided frames and normalizes each to
//!   a 32×32 grayscale buffer
//! - [`FeatureExtractor`] averages the sampled frames into a [`FeatureVector`]
//! - [`FeatureCache`] keeps vectors per [`VideoIdentity`] and persists them as CBOR
//! - [`DatasetBuilder`] walks the labeled collections and reports per-video failures
//! - [`ClassificationService`] fits the [`LabelSpace`] and classifier, and serves predictions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vigil_core::{ClassificationService, MockDecoder, PipelineConfig};
//!
//! # fn example() -> vigil_core::Result<()> {
//! let service = ClassificationService::new(
//!     PipelineConfig::default(),
//!     Arc::new(MockDecoder::new()),
//!     "dataset",
//!     "features_cache.cbor",
//! );
//!
//! let report = service.train()?;
//! println!("accuracy: {:.2}", report.accuracy);
//!
//! let prediction = service.predict(&std::fs::read("clip.mp4")?)?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod labels;
pub mod sampler;
pub mod service;

// Re-export main types for convenience
pub use cache::{FeatureCache, VideoIdentity};
pub use classifier::{
    accuracy, Classifier, ClassifierTrainer, ForestParams, RandomForest, RandomForestTrainer,
};
pub use config::{FrameGeometry, PipelineConfig, DEFAULT_FRAME_SIZE, DEFAULT_SEED, DEFAULT_TARGET_SAMPLES};
pub use dataset::{BatchReport, DatasetBuilder, DatasetItem, ItemFailure, ItemOutcome, LabeledDataset};
pub use decoder::{FrameStream, MockClip, MockDecoder, VideoDecoder};
pub use error::{Result, VigilError, CURRENT_CACHE_VERSION};
pub use extractor::{FeatureExtractor, FeatureVector};
pub use labels::{LabelSpace, LABEL_DRUNK, LABEL_SOBER, TRAINING_LABELS};
pub use sampler::{FrameSampler, SampledFrame};
pub use service::{
    split_indices, ClassificationService, Prediction, ServiceStatus, TrainedState, TrainingReport,
    TRAINED_MESSAGE,
};

#[cfg(feature = "ffmpeg")]
pub use decoder::FfmpegDecoder;
