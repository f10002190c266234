//! Prediction handler
//!
//! Handles POST /predict requests carrying one video upload.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, NO_VIDEO_MESSAGE};
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Multipart field carrying the video
pub const VIDEO_FIELD: &str = "video";

/// Response for a classified video
#[derive(Serialize, ToSchema)]
pub struct PredictResponse {
    /// Predicted class
    #[schema(example = "sober")]
    pub prediction: String,
    /// Probability of the predicted class, between 0.5 and 1.0
    #[schema(example = 0.83)]
    pub confidence: f64,
}

/// Classify a video
///
/// Accepts multipart/form-data with:
/// - **video** (required): The video file to classify
///
/// The upload is decoded into a temporary file that is removed once the
/// request completes. Uploads are never added to the feature cache.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "Model",
    request_body(
        content_type = "multipart/form-data",
        description = "Video to classify in the `video` field"
    ),
    responses(
        (status = 200, description = "Video classified", body = PredictResponse),
        (status = 400, description = "No video provided, or model not trained yet"),
        (status = 500, description = "Video could not be processed")
    )
)]
pub async fn predict_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    // A request that is not multipart at all has no video either
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(%request_id, error = %e, "Rejected non-multipart predict request");
        ApiError::bad_request(NO_VIDEO_MESSAGE)
    })?;

    let upload = MultipartFields::parse(&mut multipart, VIDEO_FIELD, state.max_file_size)
        .await?
        .require_file(NO_VIDEO_MESSAGE)?;

    tracing::info!(
        %request_id,
        bytes = upload.data.len(),
        file_name = ?upload.file_name,
        "Prediction requested"
    );

    let service = Arc::clone(&state.service);
    let prediction = tokio::task::spawn_blocking(move || service.predict(&upload.data))
        .await
        .map_err(|e| ApiError::internal(format!("Prediction task join error: {}", e)))??;

    Ok(Json(PredictResponse {
        prediction: prediction.label,
        confidence: prediction.confidence,
    }))
}
