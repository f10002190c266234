//! Training handler
//!
//! Handles POST /train requests: rebuild the dataset from the server's
//! collections and replace the in-memory model.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use vigil_core::TrainingReport;

use crate::error::ApiError;
use crate::state::AppState;

/// Response for a successful training run
#[derive(Serialize, ToSchema)]
pub struct TrainResponse {
    #[schema(example = "Model trained successfully")]
    pub message: String,
    /// Accuracy on the held-out partition
    #[schema(example = 0.875)]
    pub accuracy: f64,
    /// Videos whose features were obtained
    #[schema(example = 40)]
    pub processed_videos: usize,
    /// Videos with a recognized extension
    #[schema(example = 41)]
    pub total_videos: usize,
    /// Videos that could not be processed
    #[schema(example = 1)]
    pub failed_videos: usize,
    #[schema(example = 32)]
    pub train_size: usize,
    #[schema(example = 8)]
    pub test_size: usize,
    /// Distinct classes in the held-out partition
    #[schema(example = 2)]
    pub held_out_classes: usize,
    /// Completion time (RFC 3339)
    #[schema(example = "2024-01-01T00:00:00Z")]
    pub trained_at: String,
}

impl From<TrainingReport> for TrainResponse {
    fn from(report: TrainingReport) -> Self {
        Self {
            message: report.message,
            accuracy: report.accuracy,
            processed_videos: report.processed_videos,
            total_videos: report.total_videos,
            failed_videos: report.failed_videos,
            train_size: report.train_size,
            test_size: report.test_size,
            held_out_classes: report.held_out_classes,
            trained_at: report.trained_at.to_rfc3339(),
        }
    }
}

/// Train the classifier
///
/// Walks the `drunk/` and `sober/` collections under the dataset root,
/// extracts (or reuses cached) features, fits a fresh model on an 80/20
/// seeded split and publishes it. Unreadable videos are skipped and counted
/// in `failed_videos`.
#[utoipa::path(
    post,
    path = "/train",
    tag = "Model",
    responses(
        (status = 200, description = "Model trained", body = TrainResponse),
        (status = 500, description = "Training failed, including too few usable videos (code INSUFFICIENT_DATA)")
    )
)]
pub async fn train_handler(State(state): State<AppState>) -> Result<Json<TrainResponse>, ApiError> {
    let service = Arc::clone(&state.service);

    // Decoding and fitting are CPU bound
    let report = tokio::task::spawn_blocking(move || service.train())
        .await
        .map_err(|e| ApiError::internal(format!("Training task join error: {}", e)))??;

    Ok(Json(report.into()))
}
