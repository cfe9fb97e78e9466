//! Image input handling.
//!
//! Existence checks for image paths and base64 payload decoding. Both run before any engine work
//! so that input errors are reported without touching the engine.

use crate::types::ImageSource;
use crate::{AdaptiveOcrError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::path::Path;

/// Check if a file exists.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Resolve an image path into an [`ImageSource`].
///
/// # Errors
///
/// Returns `AdaptiveOcrError::NotFound` if the path doesn't exist.
pub fn image_from_path(path: impl AsRef<Path>) -> Result<ImageSource> {
    let path = path.as_ref();
    if !file_exists(path) {
        return Err(AdaptiveOcrError::not_found(path));
    }
    Ok(ImageSource::Path(path.to_path_buf()))
}

/// Strip an optional `data:<mime>;base64,` prefix.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    let trimmed = payload.trim();
    if trimmed.starts_with("data:")
        && let Some((header, data)) = trimmed.split_once(',')
        && header.ends_with(";base64")
    {
        return data;
    }
    trimmed
}

/// Decode a base64 image payload, with or without a data URL prefix.
///
/// # Errors
///
/// Returns `AdaptiveOcrError::Validation` for empty or malformed payloads.
pub fn image_from_base64(payload: &str) -> Result<ImageSource> {
    let data = strip_data_url_prefix(payload);
    if data.is_empty() {
        return Err(AdaptiveOcrError::validation("Base64 image payload is empty"));
    }

    let bytes = BASE64_STANDARD
        .decode(data)
        .map_err(|e| AdaptiveOcrError::validation_with_source(format!("Invalid base64 image data: {}", e), e))?;
    Ok(ImageSource::Bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_image_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scan.png");
        fs::write(&file_path, b"not really a png").unwrap();

        let source = image_from_path(&file_path).unwrap();
        assert_eq!(source, ImageSource::Path(file_path));
    }

    #[test]
    fn test_image_from_missing_path() {
        let err = image_from_path("/nonexistent/scan.png").unwrap_err();
        assert!(matches!(err, AdaptiveOcrError::NotFound { .. }));
        assert_eq!(err.to_string(), "Image file not found: /nonexistent/scan.png");
    }

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("  AAAA\n"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:text/plain,hello"), "data:text/plain,hello");
    }

    #[test]
    fn test_image_from_base64() {
        let encoded = BASE64_STANDARD.encode(b"\x89PNG fake");
        let source = image_from_base64(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(source, ImageSource::Bytes(b"\x89PNG fake".to_vec()));

        let plain = image_from_base64(&encoded).unwrap();
        assert_eq!(plain, ImageSource::Bytes(b"\x89PNG fake".to_vec()));
    }

    #[test]
    fn test_image_from_invalid_base64() {
        let err = image_from_base64("not base64 at all!").unwrap_err();
        assert!(matches!(err, AdaptiveOcrError::Validation { .. }));

        let err = image_from_base64("data:image/png;base64,").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
