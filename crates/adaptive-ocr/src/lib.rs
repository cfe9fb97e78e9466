//! Adaptive OCR - multi-pass text recognition with quality-driven retries.
//!
//! Recognizes text in images through a native engine, scores the result, and when enhancement is
//! requested and the score is weak, re-runs recognition with other page segmentation modes and
//! threshold strategies before fusing the attempts with a confidence-weighted merge.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use adaptive_ocr::{AdaptiveOcrConfig, RecognizeOptions, Recognizer};
//! use adaptive_ocr::OutputFormat;
//!
//! # fn main() -> adaptive_ocr::Result<()> {
//! let recognizer = Recognizer::native(AdaptiveOcrConfig::default());
//! let report = recognizer.ocr_image("receipt.jpg", &RecognizeOptions::default())?;
//! println!("{}", report.render(OutputFormat::Text)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **OCR** (`ocr`): engine seam, quality assessment, strategy catalog, orchestration, merging
//! - **Core** (`core`): recognizer service, configuration, image loading, report formatting
//! - **MCP** (`mcp`): tool server over stdio
//!
//! # Features
//!
//! - `tesseract`: native Tesseract engine
//! - `tokio-runtime`: concurrent batch recognition
//! - `mcp`: Model Context Protocol server

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod ocr;
pub mod types;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use error::{AdaptiveOcrError, Result};
pub use types::*;

pub use core::config::AdaptiveOcrConfig;
pub use core::format::{BatchReport, RecognitionReport};
pub use core::recognizer::{PreprocessingOptions, RecognizeOptions, Recognizer};

pub use ocr::{AdaptiveOutcome, QualityAssessment, QualityLevel, StrategyAttempt, ThresholdStrategy};
