//! Recognition service layer.
//!
//! Sits between the transports (MCP server, CLI) and the `ocr` pipeline:
//! - **Recognizer**: validates requests, manages engine sessions, runs the adaptive pipeline
//! - **Configuration**: defaults loaded from TOML, YAML or JSON
//! - **I/O**: image file and base64 payload loading
//! - **Formatting**: text and JSON reports
//!
//! # Example
//!
//! ```rust,no_run
//! use adaptive_ocr::core::config::AdaptiveOcrConfig;
//! use adaptive_ocr::core::recognizer::{RecognizeOptions, Recognizer};
//!
//! # fn example() -> adaptive_ocr::Result<()> {
//! let recognizer = Recognizer::native(AdaptiveOcrConfig::default());
//! let options = RecognizeOptions {
//!     enhance_quality: Some(true),
//!     ..Default::default()
//! };
//! let report = recognizer.ocr_image("scan.png", &options)?;
//! println!("{}", report.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
pub mod io;
pub mod recognizer;

pub use config::{AdaptiveOcrConfig, CONFIG_FILE_NAME};
pub use format::{BatchItem, BatchReport, QualityDistribution, RecognitionReport, render_languages};
pub use recognizer::{PreprocessingOptions, RecognizeOptions, Recognizer};
