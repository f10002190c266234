//! Multipart form parsing helpers
//!
//! Reads one named file field out of a multipart/form-data upload, validating
//! its Content-Type and size on the way. Other fields are drained and ignored.

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form
#[derive(Debug, Default)]
pub struct MultipartFields {
    file: Option<FileField>,
    ignored: Vec<String>,
}

impl MultipartFields {
    /// Parse a multipart request, keeping the field named `file_field`
    ///
    /// # Arguments
    /// * `multipart` - The Axum multipart extractor
    /// * `file_field` - Name of the file field to keep
    /// * `max_file_size` - Maximum allowed file size in bytes
    pub async fn parse(
        multipart: &mut Multipart,
        file_field: &str,
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name != file_field {
                fields.ignored.push(name);
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let file_name = field.file_name().map(|s| s.to_string());
            validate_content_type(content_type.as_deref())?;

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                .to_vec();
            validate_file_size(data.len(), max_file_size)?;

            fields.file = Some(FileField {
                data,
                content_type,
                file_name,
            });
        }

        if !fields.ignored.is_empty() {
            tracing::debug!(fields = ?fields.ignored, "Ignoring unexpected multipart fields");
        }

        Ok(fields)
    }

    /// Take the file field, failing with `missing_message` if it was absent
    pub fn require_file(self, missing_message: &str) -> Result<FileField, ApiError> {
        self.file
            .ok_or_else(|| ApiError::bad_request(missing_message.to_string()))
    }

    /// Names of fields that were skipped
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}
