//! End-to-end tests for the train/predict pipeline.
//!
//! These tests run the full service against a synthetic decoder: every
//! "video" is a small JSON clip description, so the pipeline is exercised
//! without FFmpeg.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use vigil_core::{
    ClassificationService, FeatureCache, FeatureVector, FrameGeometry, MockClip, MockDecoder,
    PipelineConfig, VideoIdentity, VigilError,
};

const CACHE_FILE: &str = "features_cache.cbor";

fn config() -> PipelineConfig {
    PipelineConfig {
        geometry: FrameGeometry::new(8, 8),
        n_trees: 20,
        ..PipelineConfig::default()
    }
}

fn service_with(root: &Path, decoder: Arc<MockDecoder>) -> ClassificationService {
    ClassificationService::new(config(), decoder, root, root.join(CACHE_FILE))
}

fn service(root: &Path) -> ClassificationService {
    service_with(root, Arc::new(MockDecoder::new()))
}

fn write_clip(root: &Path, label: &str, name: &str, clip: &MockClip) {
    let dir = root.join(label);
    std::fs::create_dir_all(&dir).expect("Failed to create collection dir");
    clip.write_to(&dir.join(name)).expect("Failed to write clip");
}

/// Dark clips are "drunk", bright clips are "sober".
fn populate(root: &Path, per_class: u8) {
    for i in 0..per_class {
        write_clip(
            root,
            "drunk",
            &format!("drunk_{:02}.mp4", i),
            &MockClip::gray(16, 16, 10 + i * 3, 30 + i as usize),
        );
        write_clip(
            root,
            "sober",
            &format!("sober_{:02}.mp4", i),
            &MockClip::gray(24, 16, 240 - i * 3, 60 + i as usize),
        );
    }
}

#[test]
fn test_repeated_training_is_reproducible() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 8);

    let svc = service(dir.path());
    let first = svc.train().expect("First training failed");
    let second = svc.train().expect("Second training failed");

    assert_eq!(first.accuracy, second.accuracy);
    assert_eq!(first.train_size, second.train_size);
    assert_eq!(first.test_size, second.test_size);
    assert_eq!((first.train_size, first.test_size), (12, 4));

    // A fresh service over the same files must agree too
    let other = service(dir.path()).train().expect("Fresh training failed");
    assert_eq!(first.accuracy, other.accuracy);
}

#[test]
fn test_two_video_dataset_predicts_known_label() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 1);

    let service = service(dir.path());
    let report = service.train().expect("Training failed");
    assert_eq!(report.processed_videos, 2);
    assert_eq!((report.train_size, report.test_size), (1, 1));
    assert_eq!(report.held_out_classes, 1);

    let clip = MockClip::gray(16, 16, 128, 12).to_bytes();
    let prediction = service.predict(&clip).expect("Prediction failed");
    assert!(prediction.label == "drunk" || prediction.label == "sober");
    assert!((0.5..=1.0).contains(&prediction.confidence));
}

#[test]
fn test_cache_round_trips_processed_identities() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 3);
    std::fs::write(dir.path().join("sober").join("broken.mp4"), b"\x00\x01").unwrap();

    let service = service(dir.path());
    let report = service.train().expect("Training failed");
    assert_eq!(report.total_videos, 7);
    assert_eq!(report.processed_videos, 6);
    assert_eq!(report.failed_videos, 1);

    let reloaded = FeatureCache::new(dir.path().join(CACHE_FILE), config().geometry);
    assert_eq!(reloaded.load(), 6);

    let expected = service.cache().identities();
    assert_eq!(reloaded.identities(), expected);
    assert!(!expected
        .iter()
        .any(|id| id.as_str().ends_with("broken.mp4")));

    for identity in &expected {
        assert_eq!(reloaded.get(identity), service.cache().get(identity));
    }
}

#[test]
fn test_second_training_reuses_persisted_features() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 3);

    service(dir.path()).train().expect("Training failed");

    // A new process with a fresh decoder should not decode anything
    let decoder = Arc::new(MockDecoder::new());
    let restarted = service_with(dir.path(), Arc::clone(&decoder));
    restarted.train().expect("Retraining failed");
    assert_eq!(decoder.open_count(), 0);
}

#[test]
fn test_corrupt_cache_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CACHE_FILE), b"definitely not cbor").unwrap();

    let cache = FeatureCache::new(dir.path().join(CACHE_FILE), config().geometry);
    assert_eq!(cache.load(), 0);
    assert!(cache.is_empty());

    populate(dir.path(), 2);
    let report = service(dir.path()).train().expect("Training failed");
    assert_eq!(report.processed_videos, 4);
}

#[test]
fn test_predict_before_train_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 2);

    let decoder = Arc::new(MockDecoder::new());
    let service = service_with(dir.path(), Arc::clone(&decoder));
    let clip = MockClip::gray(16, 16, 10, 5).to_bytes();

    assert!(matches!(
        service.predict(&clip),
        Err(VigilError::ModelNotTrained)
    ));
    assert!(!service.is_trained());
    assert!(service.cache().is_empty());
    assert_eq!(decoder.open_count(), 0);
    assert!(!dir.path().join(CACHE_FILE).exists());
}

#[test]
fn test_unreadable_videos_reduce_processed_count() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 4);
    std::fs::write(dir.path().join("drunk").join("zz_truncated.mp4"), b"{").unwrap();
    std::fs::write(dir.path().join("drunk").join("readme.txt"), b"ignored").unwrap();

    let report = service(dir.path()).train().expect("Training failed");
    assert_eq!(report.total_videos, 9);
    assert_eq!(report.processed_videos, 8);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, "drunk");
}

#[test]
fn test_zero_frame_video_is_a_zero_vector_not_a_failure() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 2);
    write_clip(dir.path(), "sober", "empty.mp4", &MockClip::gray(16, 16, 99, 0));

    let service = service(dir.path());
    let report = service.train().expect("Training failed");
    assert_eq!(report.processed_videos, 5);
    assert_eq!(report.failed_videos, 0);

    let identity = VideoIdentity::from_path(&dir.path().join("sober").join("empty.mp4"));
    assert_eq!(
        service.cache().get(&identity),
        Some(FeatureVector::zeros(64))
    );
}

#[test]
fn test_predictions_stay_valid_while_retraining() {
    let dir = TempDir::new().unwrap();
    populate(dir.path(), 4);

    let service = Arc::new(service(dir.path()));
    service.train().expect("Initial training failed");

    let trainer = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for _ in 0..3 {
                service.train().expect("Retraining failed");
            }
        })
    };

    let clip = MockClip::gray(16, 16, 235, 8).to_bytes();
    for _ in 0..10 {
        let prediction = service.predict(&clip).expect("Prediction failed");
        assert_eq!(prediction.label, "sober");
    }

    trainer.join().unwrap();
}
