//! CLI integration tests for vigil-cli.
//!
//! These tests run the actual binary against temporary datasets of mock
//! clips (`--mock`), checking outputs, exit codes, and the cache file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vigil_core::MockClip;

/// Get a Command for the vigil binary.
fn vigil() -> Command {
    Command::cargo_bin("vigil").unwrap()
}

fn write_clip(root: &Path, label: &str, name: &str, clip: &MockClip) {
    let dir = root.join(label);
    fs::create_dir_all(&dir).unwrap();
    clip.write_to(&dir.join(name)).unwrap();
}

/// Dark clips under drunk/, bright clips under sober/.
fn populate(root: &Path) {
    for i in 0..5u8 {
        write_clip(root, "drunk", &format!("d{}.mp4", i), &MockClip::gray(16, 16, 12 + i * 4, 8));
        write_clip(root, "sober", &format!("s{}.mp4", i), &MockClip::gray(16, 16, 238 - i * 4, 8));
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Video impairment screening"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn test_version_displays_version() {
    vigil()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn test_help_shows_exit_codes() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_train_help_shows_options() {
    vigil()
        .args(["train", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dataset"))
        .stdout(predicate::str::contains("--cache"))
        .stdout(predicate::str::contains("--trees"))
        .stdout(predicate::str::contains("--format"));
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_predict_missing_video_exits_66() {
    let temp = TempDir::new().unwrap();

    vigil()
        .args(["--mock", "predict", path_str(&temp.path().join("nope.mp4"))])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_extract_missing_video_exits_66() {
    vigil()
        .args(["--mock", "extract", "/nonexistent/clip.mp4"])
        .assert()
        .code(66);
}

#[test]
fn test_train_empty_dataset_exits_65() {
    let temp = TempDir::new().unwrap();

    vigil()
        .args(["--mock", "train", "--dataset", path_str(temp.path())])
        .arg("--cache")
        .arg(temp.path().join("cache.cbor"))
        .assert()
        .code(65);
}

#[test]
fn test_invalid_format_is_usage_error() {
    vigil()
        .args(["train", "--format", "yaml"])
        .assert()
        .code(2);
}

// ============================================================================
// Train / Predict Tests
// ============================================================================

#[test]
fn test_train_writes_cache_and_reports() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let cache = temp.path().join("cache.cbor");

    vigil()
        .args(["--mock", "--color", "never", "train", "--trees", "15"])
        .arg("--dataset")
        .arg(temp.path())
        .arg("--cache")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("Model trained successfully"))
        .stdout(predicate::str::contains("10 of 10"))
        .stdout(predicate::str::contains("8 train / 2 held out"));

    assert!(cache.exists(), "Cache file should exist after training");
}

#[test]
fn test_train_json_output() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    fs::write(temp.path().join("drunk").join("broken.mp4"), b"garbage").unwrap();

    let output = vigil()
        .args(["--mock", "train", "--format", "json", "--trees", "15"])
        .arg("--dataset")
        .arg(temp.path())
        .arg("--cache")
        .arg(temp.path().join("cache.cbor"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["message"], "Model trained successfully");
    assert_eq!(json["total_videos"], 11);
    assert_eq!(json["processed_videos"], 10);
    assert_eq!(json["failed_videos"], 1);
    assert!(json["failures"][0]["identity"]
        .as_str()
        .unwrap()
        .ends_with("broken.mp4"));
}

#[test]
fn test_predict_json_output() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let video = temp.path().join("query.mp4");
    MockClip::gray(16, 16, 240, 6).write_to(&video).unwrap();

    let output = vigil()
        .args(["--mock", "predict", "--format", "json", "--trees", "15"])
        .arg(&video)
        .arg("--dataset")
        .arg(temp.path())
        .arg("--cache")
        .arg(temp.path().join("cache.cbor"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["prediction"], "sober");
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));
}

#[test]
fn test_predict_quiet_prints_label_only() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let video = temp.path().join("query.mp4");
    MockClip::gray(16, 16, 10, 6).write_to(&video).unwrap();

    vigil()
        .args(["--mock", "-q", "predict", "--trees", "15"])
        .arg(&video)
        .arg("--dataset")
        .arg(temp.path())
        .arg("--cache")
        .arg(temp.path().join("cache.cbor"))
        .assert()
        .success()
        .stdout("drunk\n");
}

// ============================================================================
// Extract Tests
// ============================================================================

#[test]
fn test_extract_json_has_full_vector() {
    let temp = TempDir::new().unwrap();
    let video = temp.path().join("clip.mp4");
    MockClip::gray(64, 48, 77, 4).write_to(&video).unwrap();

    let output = vigil()
        .args(["--mock", "extract", "--format", "json"])
        .arg(&video)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 1024);
    assert!(features
        .iter()
        .all(|v| (v.as_f64().unwrap() - 77.0).abs() < 1.0));
}

#[test]
fn test_extract_zero_frame_video_notes_zero_vector() {
    let temp = TempDir::new().unwrap();
    let video = temp.path().join("empty.mp4");
    MockClip::gray(16, 16, 50, 0).write_to(&video).unwrap();

    vigil()
        .args(["--mock", "--color", "never", "extract"])
        .arg(&video)
        .assert()
        .success()
        .stdout(predicate::str::contains("all-zero vector"));
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_cache_info_and_clear() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let cache = temp.path().join("cache.cbor");

    vigil()
        .args(["--mock", "-q", "train", "--trees", "15"])
        .arg("--dataset")
        .arg(temp.path())
        .arg("--cache")
        .arg(&cache)
        .assert()
        .success();

    vigil()
        .args(["-q", "cache", "info", "--cache"])
        .arg(&cache)
        .assert()
        .success()
        .stdout("10\n");

    vigil()
        .args(["cache", "info", "--list", "--cache"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("d0.mp4"))
        .stdout(predicate::str::contains("s4.mp4"));

    vigil()
        .args(["cache", "clear", "--cache"])
        .arg(&cache)
        .assert()
        .success();
    assert!(!cache.exists());
}

#[test]
fn test_cache_info_without_file() {
    let temp = TempDir::new().unwrap();

    vigil()
        .args(["-q", "cache", "info", "--cache"])
        .arg(temp.path().join("missing.cbor"))
        .assert()
        .success()
        .stdout("0\n");
}
