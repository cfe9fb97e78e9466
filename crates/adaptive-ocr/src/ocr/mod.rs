//! Adaptive recognition core.
//!
//! The recognize → assess → retry → merge loop and the engine it drives:
//!
//! - **Quality assessment**: score a single pass ([`quality`])
//! - **Strategy catalog**: map settings to engine parameter bundles ([`strategy`])
//! - **Orchestration**: decide and run retry passes ([`orchestrator`])
//! - **Merging**: fuse passes into one result ([`merge`])
//! - **Engine contract**: the session trait every engine implements ([`engine`])
//! - **Native Tesseract**: behind the `tesseract` feature ([`tesseract_backend`])
//!
//! # Example
//!
//! ```rust
//! use adaptive_ocr::ocr::{assess, QualityLevel};
//! use adaptive_ocr::{BoundingBox, RecognitionResult, Word};
//!
//! let words = (0..3)
//!     .map(|i| Word {
//!         text: format!("word{}", i),
//!         confidence: 92.0,
//!         bbox: BoundingBox::new(i * 60, 0, i * 60 + 50, 20),
//!     })
//!     .collect();
//! let result = RecognitionResult { confidence: 92.0, words, ..Default::default() };
//! assert_eq!(assess(&result).classification, QualityLevel::Excellent);
//!
//! // Very few words at very high confidence are penalized
//! let sparse = RecognitionResult { confidence: 92.0, ..Default::default() };
//! let quality = assess(&sparse);
//! assert_eq!(quality.score, 87.0);
//! assert_eq!(quality.classification, QualityLevel::Good);
//! ```
pub mod engine;
pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod quality;
pub mod strategy;
#[cfg(feature = "tesseract")]
pub mod tesseract_backend;
pub mod tsv;
pub mod validation;

pub use engine::{EngineFactory, RecognitionEngine, with_session};
pub use error::OcrError;
pub use merge::merge;
pub use orchestrator::{AdaptiveOutcome, RecognitionRequest, StrategyAttempt, plan_retries, recognize_adaptive};
pub use quality::{QualityAssessment, QualityLevel, assess};
pub use strategy::{EngineParams, ParamSet, ThresholdStrategy, enhanced_params, threshold_params};
#[cfg(feature = "tesseract")]
pub use tesseract_backend::{TesseractEngine, TesseractEngineFactory};
pub use tsv::parse_tsv;
pub use validation::{SUPPORTED_LANGUAGES, validate_language_code};
