//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod predict;
pub mod train;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use predict::{predict_handler, PredictResponse, VIDEO_FIELD};
pub use train::{train_handler, TrainResponse};
