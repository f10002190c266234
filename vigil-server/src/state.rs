//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use vigil_core::ClassificationService;

use crate::validation::DEFAULT_MAX_FILE_SIZE;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Train/predict pipeline with its single model slot
    pub service: Arc<ClassificationService>,
    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,
}

impl AppState {
    pub fn new(service: Arc<ClassificationService>) -> Self {
        Self {
            service,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}
