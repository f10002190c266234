//! Train/predict orchestration.
//!
//! [`ClassificationService`] owns one model slot. Training builds a complete
//! `{model, labels}` pair off to the side and swaps it in with a single write,
//! so a concurrent prediction always sees either the previous pair or the new
//! one.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::FeatureCache;
use crate::classifier::{accuracy, Classifier, ClassifierTrainer, ForestParams, RandomForestTrainer};
use crate::config::PipelineConfig;
use crate::dataset::{BatchReport, DatasetBuilder, ItemFailure, LabeledDataset};
use crate::decoder::VideoDecoder;
use crate::error::{Result, VigilError};
use crate::extractor::{FeatureExtractor, FeatureVector};
use crate::labels::{LabelSpace, TRAINING_LABELS};
use crate::sampler::FrameSampler;

/// Message returned on every successful training run.
pub const TRAINED_MESSAGE: &str = "Model trained successfully";

/// Suffix given to uploaded videos so decoders can sniff the container.
const UPLOAD_SUFFIX: &str = ".mp4";

/// Outcome of a successful training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub message: String,
    /// Fraction of held-out rows classified correctly
    pub accuracy: f64,
    /// Videos whose features were obtained
    pub processed_videos: usize,
    /// Videos with a recognized extension
    pub total_videos: usize,
    /// Videos that could not be processed
    pub failed_videos: usize,
    pub train_size: usize,
    pub test_size: usize,
    /// Distinct classes present in the held-out partition
    pub held_out_classes: usize,
    pub trained_at: DateTime<Utc>,
    /// Per-video failure details
    pub failures: Vec<ItemFailure>,
}

/// A classified video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, always in `[0.5, 1.0]` for two classes
    pub confidence: f64,
}

/// Snapshot of the service for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub trained: bool,
    pub classes: Vec<String>,
    pub cached_features: usize,
    pub trained_at: Option<DateTime<Utc>>,
}

/// A published model with the label space it was trained against.
pub struct TrainedState {
    model: Box<dyn Classifier>,
    labels: LabelSpace,
    trained_at: DateTime<Utc>,
}

impl TrainedState {
    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    fn classify(&self, features: &FeatureVector) -> Result<Prediction> {
        let proba = self.model.predict_proba(features.as_slice())?;

        // Binary threshold on the class encoded as 1
        let positive = proba.get(1).copied().unwrap_or(0.0);
        let (index, confidence) = if positive > 0.5 {
            (1, positive)
        } else {
            (0, 1.0 - positive)
        };

        Ok(Prediction {
            label: self.labels.decode(index)?.to_string(),
            confidence,
        })
    }
}

/// Shuffle `0..n` with `seed` and cut it into `(train, test)` index sets.
///
/// The test partition holds `ceil(n * test_fraction)` rows and never fewer
/// than one. Fails with `InsufficientData` when no rows are left to train on.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    let test_size = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n.max(1));
    if n <= test_size {
        return Err(VigilError::InsufficientData(format!(
            "{} video(s) leave nothing to train on after holding out {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let test = indices[..test_size].to_vec();
    let train = indices[test_size..].to_vec();
    Ok((train, test))
}

/// Trains and queries the video classifier.
pub struct ClassificationService {
    config: PipelineConfig,
    dataset_root: PathBuf,
    extractor: FeatureExtractor,
    cache: Arc<FeatureCache>,
    trainer: Box<dyn ClassifierTrainer>,
    upload_dir: Option<PathBuf>,
    state: RwLock<Option<Arc<TrainedState>>>,
    train_lock: Mutex<()>,
}

impl ClassificationService {
    /// Create an untrained service.
    ///
    /// `dataset_root` holds one directory per class; `cache_path` is where
    /// extracted features are persisted between runs.
    pub fn new(
        config: PipelineConfig,
        decoder: Arc<dyn VideoDecoder>,
        dataset_root: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        let sampler = FrameSampler::new(decoder, config.geometry)
            .with_target_samples(config.target_samples);
        let cache = Arc::new(FeatureCache::new(cache_path, config.geometry));
        let trainer = Box::new(RandomForestTrainer::new(ForestParams::from(&config)));

        Self {
            extractor: FeatureExtractor::new(sampler),
            dataset_root: dataset_root.into(),
            cache,
            trainer,
            upload_dir: None,
            state: RwLock::new(None),
            train_lock: Mutex::new(()),
            config,
        }
    }

    /// Create a service decoding through the FFmpeg tools found in `PATH`.
    #[cfg(feature = "ffmpeg")]
    pub fn with_ffmpeg(
        config: PipelineConfig,
        dataset_root: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let decoder = Arc::new(crate::decoder::FfmpegDecoder::new()?);
        Ok(Self::new(config, decoder, dataset_root, cache_path))
    }

    /// Replace the classifier backend.
    pub fn with_trainer(mut self, trainer: Box<dyn ClassifierTrainer>) -> Self {
        self.trainer = trainer;
        self
    }

    /// Spool uploaded videos into `dir` instead of the system temp directory.
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    pub fn cache(&self) -> &Arc<FeatureCache> {
        &self.cache
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Currently published model, if any.
    pub fn current(&self) -> Option<Arc<TrainedState>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_trained(&self) -> bool {
        self.current().is_some()
    }

    pub fn status(&self) -> ServiceStatus {
        let current = self.current();
        ServiceStatus {
            trained: current.is_some(),
            classes: current
                .as_ref()
                .map(|s| s.labels.classes().to_vec())
                .unwrap_or_default(),
            cached_features: self.cache.len(),
            trained_at: current.map(|s| s.trained_at),
        }
    }

    /// Rebuild the dataset, fit a fresh model and publish it.
    pub fn train(&self) -> Result<TrainingReport> {
        let _training = self.train_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();
        info!(root = %self.dataset_root.display(), "Training started");

        self.cache.load();

        let builder = DatasetBuilder::new(&self.dataset_root, &TRAINING_LABELS, &self.config);
        let (dataset, batch) = builder
            .build(&self.cache, &self.extractor)
            .map_err(VigilError::training)?;

        if let Err(e) = self.cache.persist() {
            warn!(path = %self.cache.path().display(), error = %e, "Failed to persist feature cache");
        }

        let report = self.fit_and_publish(dataset, batch).map_err(VigilError::training)?;

        info!(
            accuracy = report.accuracy,
            processed = report.processed_videos,
            total = report.total_videos,
            failed = report.failed_videos,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Training completed"
        );
        Ok(report)
    }

    fn fit_and_publish(&self, dataset: LabeledDataset, batch: BatchReport) -> Result<TrainingReport> {
        if dataset.is_empty() {
            return Err(VigilError::InsufficientData(format!(
                "No usable videos under {} ({} found)",
                self.dataset_root.display(),
                batch.total
            )));
        }

        let mut labels = LabelSpace::new();
        let targets = Array1::from(labels.fit(dataset.labels.as_slice())?);

        let (train_rows, test_rows) =
            split_indices(dataset.len(), self.config.test_fraction, self.config.seed)?;

        let x_train = dataset.records.select(Axis(0), &train_rows);
        let y_train = targets.select(Axis(0), &train_rows);
        let x_test = dataset.records.select(Axis(0), &test_rows);
        let y_test = targets.select(Axis(0), &test_rows);

        debug!(
            train = train_rows.len(),
            test = test_rows.len(),
            classes = labels.len(),
            "Fitting classifier"
        );
        let model = self.trainer.fit(&x_train, &y_train, labels.len())?;

        let held_out_classes = y_test.iter().collect::<BTreeSet<_>>().len();
        if held_out_classes < 2 {
            warn!(
                test_size = test_rows.len(),
                held_out_classes, "Held-out partition covers a single class, accuracy is not informative"
            );
        }
        // A failed evaluation must leave the previous model in place
        let accuracy = accuracy(model.as_ref(), &x_test, &y_test)?;

        let trained_at = Utc::now();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(TrainedState {
            model,
            labels,
            trained_at,
        }));

        Ok(TrainingReport {
            message: TRAINED_MESSAGE.to_string(),
            accuracy,
            processed_videos: batch.processed,
            total_videos: batch.total,
            failed_videos: batch.failures.len(),
            train_size: train_rows.len(),
            test_size: test_rows.len(),
            held_out_classes,
            trained_at,
            failures: batch.failures,
        })
    }

    /// Classify an uploaded video.
    ///
    /// The bytes go to a temporary file that is removed on every exit path.
    /// The feature cache is bypassed.
    pub fn predict(&self, video: &[u8]) -> Result<Prediction> {
        let state = self.current().ok_or(VigilError::ModelNotTrained)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("vigil-upload-").suffix(UPLOAD_SUFFIX);
        let mut upload = match &self.upload_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| VigilError::prediction(e.into()))?;
        upload
            .write_all(video)
            .and_then(|_| upload.flush())
            .map_err(|e| VigilError::prediction(e.into()))?;

        debug!(bytes = video.len(), path = %upload.path().display(), "Extracting uploaded video");
        self.classify_path(&state, upload.path())
    }

    /// Classify a video already on disk, bypassing the feature cache.
    pub fn predict_path(&self, path: &Path) -> Result<Prediction> {
        let state = self.current().ok_or(VigilError::ModelNotTrained)?;
        self.classify_path(&state, path)
    }

    fn classify_path(&self, state: &TrainedState, path: &Path) -> Result<Prediction> {
        let prediction = self
            .extractor
            .extract(path)
            .and_then(|features| state.classify(&features))
            .map_err(VigilError::prediction)?;

        info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            "Prediction completed"
        );
        Ok(prediction)
    }
}
