//! Training dataset assembly.
//!
//! The training data lives in one directory per class under a common root;
//! the directory name is the ground-truth label of every video inside it.
//!
//! ```text
//! <root>/drunk/clip_001.mp4
//! <root>/sober/clip_002.mp4
//! ```
//!
//! Per-video failures never abort a batch. Every recognized file is recorded
//! as an [`ItemOutcome`] and the batch continues.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{FeatureCache, VideoIdentity};
use crate::config::PipelineConfig;
use crate::error::{Result, VigilError};
use crate::extractor::{FeatureExtractor, FeatureVector};

/// One video discovered under the dataset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetItem {
    pub label: String,
    pub path: PathBuf,
}

impl DatasetItem {
    pub fn identity(&self) -> VideoIdentity {
        VideoIdentity::from_path(&self.path)
    }
}

/// Result of processing one item.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Success {
        identity: VideoIdentity,
        label: String,
        features: FeatureVector,
    },
    Failed {
        identity: VideoIdentity,
        label: String,
        reason: String,
    },
}

/// A failed item, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub identity: String,
    pub label: String,
    pub reason: String,
}

/// Tally of one dataset pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Videos whose features were obtained
    pub processed: usize,
    /// Videos with a recognized extension
    pub total: usize,
    /// Videos that could not be processed
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.total += 1;
        match outcome {
            ItemOutcome::Success { .. } => self.processed += 1,
            ItemOutcome::Failed {
                identity,
                label,
                reason,
            } => self.failures.push(ItemFailure {
                identity: identity.to_string(),
                label: label.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Feature matrix and symbolic labels, row-aligned.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    /// One row per processed video
    pub records: Array2<f64>,
    /// Class name per row
    pub labels: Vec<String>,
    /// Source identity per row
    pub identities: Vec<VideoIdentity>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Stack successful outcomes into a matrix with `feature_len` columns.
    pub fn from_outcomes(outcomes: &[ItemOutcome], feature_len: usize) -> Result<Self> {
        let mut flat = Vec::new();
        let mut labels = Vec::new();
        let mut identities = Vec::new();

        for outcome in outcomes {
            if let ItemOutcome::Success {
                identity,
                label,
                features,
            } = outcome
            {
                if features.len() != feature_len {
                    return Err(VigilError::InsufficientData(format!(
                        "{} has {} features, expected {}",
                        identity,
                        features.len(),
                        feature_len
                    )));
                }
                flat.extend_from_slice(features.as_slice());
                labels.push(label.clone());
                identities.push(identity.clone());
            }
        }

        let records = Array2::from_shape_vec((labels.len(), feature_len), flat)
            .map_err(|e| VigilError::InsufficientData(e.to_string()))?;

        Ok(Self {
            records,
            labels,
            identities,
        })
    }
}

/// Walks labeled collections and extracts features through the cache.
pub struct DatasetBuilder<'a> {
    root: PathBuf,
    labels: Vec<String>,
    config: &'a PipelineConfig,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, labels: &[S], config: &'a PipelineConfig) -> Self {
        Self {
            root: root.into(),
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List recognized videos, collection by collection, in file-name order.
    ///
    /// A missing collection directory counts as empty.
    pub fn discover(&self) -> Vec<DatasetItem> {
        let mut items = Vec::new();

        for label in &self.labels {
            let dir = self.root.join(label);
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(dir = %dir.display(), "Collection directory missing");
                    continue;
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot read collection directory");
                    continue;
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && self.is_video(path))
                .collect();
            paths.sort();

            items.extend(paths.into_iter().map(|path| DatasetItem {
                label: label.clone(),
                path,
            }));
        }

        items
    }

    fn is_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_video_extension(ext))
    }

    /// Extract features for every discovered item.
    pub fn process(&self, cache: &FeatureCache, extractor: &FeatureExtractor) -> Vec<ItemOutcome> {
        self.discover()
            .into_iter()
            .map(|item| {
                let identity = item.identity();
                match cache.get_or_compute(&identity, |id| extractor.extract(id.as_path())) {
                    Ok(features) => ItemOutcome::Success {
                        identity,
                        label: item.label,
                        features,
                    },
                    Err(e) => {
                        warn!(identity = %identity, error = %e, "Error processing video");
                        ItemOutcome::Failed {
                            identity,
                            label: item.label,
                            reason: e.to_string(),
                        }
                    }
                }
            })
            .collect()
    }

    /// Process every item and assemble the dataset plus its batch report.
    pub fn build(
        &self,
        cache: &FeatureCache,
        extractor: &FeatureExtractor,
    ) -> Result<(LabeledDataset, BatchReport)> {
        let outcomes = self.process(cache, extractor);

        let mut report = BatchReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }

        let dataset = LabeledDataset::from_outcomes(&outcomes, extractor.feature_len())?;
        Ok((dataset, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::FrameGeometry;
    use crate::decoder::{MockClip, MockDecoder};
    use crate::labels::TRAINING_LABELS;
    use crate::sampler::FrameSampler;
    use tempfile::TempDir;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(FrameSampler::new(
            Arc::new(MockDecoder::new()),
            FrameGeometry::new(4, 4),
        ))
    }

    fn write_clip(root: &Path, label: &str, name: &str, level: u8) {
        let dir = root.join(label);
        std::fs::create_dir_all(&dir).unwrap();
        MockClip::gray(8, 8, level, 4)
            .write_to(&dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_discover_filters_extensions_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_clip(dir.path(), "drunk", "b.mp4", 10);
        write_clip(dir.path(), "drunk", "a.MP4", 10);
        write_clip(dir.path(), "drunk", "notes.txt", 10);
        write_clip(dir.path(), "sober", "c.mp4", 200);

        let config = PipelineConfig::default();
        let builder = DatasetBuilder::new(dir.path(), &TRAINING_LABELS, &config);
        let items = builder.discover();

        let names: Vec<(String, String)> = items
            .iter()
            .map(|i| {
                (
                    i.label.clone(),
                    i.path.file_name().unwrap().to_string_lossy().into_owned(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("drunk".to_string(), "a.MP4".to_string()),
                ("drunk".to_string(), "b.mp4".to_string()),
                ("sober".to_string(), "c.mp4".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_collections_are_empty() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::default();
        let builder = DatasetBuilder::new(dir.path(), &TRAINING_LABELS, &config);
        assert!(builder.discover().is_empty());
    }

    #[test]
    fn test_build_tallies_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        write_clip(dir.path(), "drunk", "ok.mp4", 10);
        std::fs::write(dir.path().join("drunk").join("corrupt.mp4"), b"garbage").unwrap();
        write_clip(dir.path(), "sober", "ok.mp4", 200);

        let config = PipelineConfig::default();
        let cache = FeatureCache::new(dir.path().join("cache.cbor"), FrameGeometry::new(4, 4));
        let builder = DatasetBuilder::new(dir.path(), &TRAINING_LABELS, &config);
        let (dataset, report) = builder.build(&cache, &extractor()).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].identity.ends_with("corrupt.mp4"));

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records.dim(), (2, 16));
        assert_eq!(dataset.labels, vec!["drunk", "sober"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_from_outcomes_rejects_wrong_width() {
        let outcomes = vec![ItemOutcome::Success {
            identity: "a.mp4".into(),
            label: "drunk".into(),
            features: FeatureVector::zeros(3),
        }];
        assert!(LabeledDataset::from_outcomes(&outcomes, 4).is_err());
    }
}
