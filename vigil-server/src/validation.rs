//! Checks applied to the `video` field before it reaches the decoder.

use crate::error::ApiError;

/// Largest video accepted by default (100 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

const MB: f64 = 1024.0 * 1024.0;

/// How an upload declared itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// `video/*`
    Video,
    /// `application/octet-stream`, or no declared type at all
    Opaque,
}

/// Classify a declared media type, ignoring parameters and case.
///
/// Browsers and `curl -F` send either a `video/*` type or nothing useful;
/// anything else is almost certainly the wrong file.
pub fn upload_kind(content_type: Option<&str>) -> Option<UploadKind> {
    let Some(raw) = content_type else {
        return Some(UploadKind::Opaque);
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("video", subtype)) if !subtype.is_empty() => Some(UploadKind::Video),
        Some(("application", "octet-stream")) => Some(UploadKind::Opaque),
        _ => None,
    }
}

/// Reject uploads that do not claim to be video.
pub fn validate_content_type(content_type: Option<&str>) -> Result<UploadKind, ApiError> {
    upload_kind(content_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Expected a video upload, got '{}'",
            content_type.unwrap_or_default()
        ))
    })
}

/// Reject videos larger than `max_size` bytes.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size <= max_size {
        return Ok(());
    }
    Err(ApiError::bad_request(format!(
        "Video is {:.1} MB, the limit is {:.1} MB",
        size as f64 / MB,
        max_size as f64 / MB
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_types_accepted() {
        assert_eq!(upload_kind(Some("video/mp4")), Some(UploadKind::Video));
        assert_eq!(upload_kind(Some("VIDEO/QuickTime")), Some(UploadKind::Video));
        assert_eq!(
            upload_kind(Some("video/mp4; codecs=\"avc1.42E01E\"")),
            Some(UploadKind::Video)
        );
    }

    #[test]
    fn test_opaque_uploads_accepted() {
        assert_eq!(
            upload_kind(Some("application/octet-stream")),
            Some(UploadKind::Opaque)
        );
        assert_eq!(upload_kind(None), Some(UploadKind::Opaque));
    }

    #[test]
    fn test_other_types_rejected() {
        assert!(validate_content_type(Some("image/jpeg")).is_err());
        assert!(validate_content_type(Some("text/html")).is_err());
        assert!(validate_content_type(Some("video/")).is_err());
        assert!(validate_content_type(Some("application/octet-streamx")).is_err());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let max = 10 * 1024 * 1024;
        assert!(validate_file_size(max, max).is_ok());

        let err = validate_file_size(max + 512 * 1024, max).unwrap_err();
        assert_eq!(err.client_message(), "Video is 10.5 MB, the limit is 10.0 MB");
    }
}
