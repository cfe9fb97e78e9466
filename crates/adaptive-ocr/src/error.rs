//! Error types for Adaptive OCR.
//!
//! All fallible operations in the crate return [`AdaptiveOcrError`]:
//!
//! - `Io` wraps `std::io::Error` and always bubbles up unchanged
//! - `NotFound` is raised before any engine work when an image path does not exist
//! - `Validation` covers bad parameters (psm/oem ranges, language codes, base64 payloads)
//! - `Ocr` covers engine failures during configure, recognize or release
//!
//! A low quality score is never an error; it only drives the retry policy.
//!
//! # Example
//!
//! ```rust
//! use adaptive_ocr::{AdaptiveOcrError, Result};
//!
//! fn check_psm(psm: u8) -> Result<u8> {
//!     if psm > 13 {
//!         return Err(AdaptiveOcrError::validation(format!("Invalid psm: {}", psm)));
//!     }
//!     Ok(psm)
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `AdaptiveOcrError`.
pub type Result<T> = std::result::Result<T, AdaptiveOcrError>;

/// Main error type for all Adaptive OCR operations.
#[derive(Debug, Error)]
pub enum AdaptiveOcrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AdaptiveOcrError {
    fn from(err: serde_json::Error) -> Self {
        AdaptiveOcrError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::ocr::error::OcrError> for AdaptiveOcrError {
    fn from(err: crate::ocr::error::OcrError) -> Self {
        match err {
            crate::ocr::error::OcrError::InvalidLanguageCode(_) | crate::ocr::error::OcrError::InvalidConfiguration(_) => {
                AdaptiveOcrError::Validation {
                    message: err.to_string(),
                    source: Some(Box::new(err)),
                }
            }
            crate::ocr::error::OcrError::ImageProcessingFailed(_) => AdaptiveOcrError::ImageProcessing {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
            _ => AdaptiveOcrError::Ocr {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl AdaptiveOcrError {
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);

    /// Create a not-found error for an image path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}
