//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use vigil_core::VigilError;

/// Client-facing message when the predict form has no `video` field.
pub const NO_VIDEO_MESSAGE: &str = "No video file provided";

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Vigil core error - error from the screening pipeline
    #[error("Vigil error: {0}")]
    Vigil(#[from] VigilError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Vigil(ref e) => match e {
                // Querying before training is a client sequencing error
                VigilError::ModelNotTrained => StatusCode::BAD_REQUEST,

                // FFmpeg missing from the host
                VigilError::DecoderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

                VigilError::InsufficientData(_)
                | VigilError::TrainingError(_)
                | VigilError::PredictionError(_)
                | VigilError::UnknownLabel(_)
                | VigilError::SourceUnavailable(_)
                | VigilError::Decode(_)
                | VigilError::Classifier(_)
                | VigilError::CacheError(_)
                | VigilError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Vigil(ref e) => match e {
                VigilError::ModelNotTrained => "MODEL_NOT_TRAINED",
                VigilError::InsufficientData(_) => "INSUFFICIENT_DATA",
                VigilError::TrainingError(_) => "TRAINING_FAILED",
                VigilError::PredictionError(_) => "PREDICTION_FAILED",
                VigilError::UnknownLabel(_) => "UNKNOWN_LABEL",
                VigilError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
                VigilError::DecoderUnavailable(_) => "DECODER_UNAVAILABLE",
                VigilError::Decode(_) => "DECODE_ERROR",
                VigilError::Classifier(_) => "CLASSIFIER_ERROR",
                VigilError::CacheError(_) => "CACHE_ERROR",
                VigilError::Io(_) => "IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
            // For Vigil errors, sanitize internal details such as paths
            Self::Vigil(ref e) => match e {
                VigilError::ModelNotTrained => e.to_string(),
                VigilError::InsufficientData(_) => {
                    "Not enough usable training videos".to_string()
                }
                VigilError::TrainingError(_) => "Model training failed".to_string(),
                VigilError::PredictionError(_) => "Could not process video".to_string(),
                VigilError::DecoderUnavailable(_) => "Video decoder unavailable".to_string(),
                VigilError::UnknownLabel(_) => "Unknown class label".to_string(),
                VigilError::SourceUnavailable(_) => "Video source unavailable".to_string(),
                VigilError::Decode(_) => "Video could not be decoded".to_string(),
                VigilError::Classifier(_) => "Classifier failure".to_string(),
                VigilError::CacheError(_) => "Feature cache failure".to_string(),
                VigilError::Io(_) => "I/O failure".to_string(),
            },
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
            Self::Vigil(_) => "vigil",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
