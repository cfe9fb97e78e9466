//! Top-level recognition operations.
//!
//! [`Recognizer`] owns an engine factory and the configured defaults. Each operation validates its
//! input, obtains a fresh engine session, runs the pipeline, releases the session and returns a
//! report ready for rendering. All operations block; async callers run them on a blocking thread.

use std::path::Path;
#[cfg(feature = "tokio-runtime")]
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "mcp")]
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::core::config::AdaptiveOcrConfig;
use crate::core::format::{BatchItem, BatchReport, RecognitionReport};
use crate::core::io::{image_from_base64, image_from_path};
use crate::ocr::engine::{EngineFactory, native_factory, with_session};
use crate::ocr::orchestrator::{AdaptiveOutcome, RecognitionRequest, recognize_adaptive, recognize_once};
use crate::ocr::strategy::{EngineParams, OEM_DEFAULT, PSM_SINGLE_BLOCK, ThresholdStrategy};
use crate::ocr::validation::{validate_language_code, validate_oem, validate_psm, validate_region};
use crate::types::{ImageSource, Region};
use crate::{AdaptiveOcrError, Result};

/// Per-request overrides of the configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizeOptions {
    pub language: Option<String>,
    pub psm: Option<u8>,
    pub oem: Option<u8>,
    pub enhance_quality: Option<bool>,
}

impl RecognizeOptions {
    /// Overlay onto the config defaults and validate.
    pub fn resolve(&self, config: &AdaptiveOcrConfig) -> Result<RecognitionRequest> {
        let request = RecognitionRequest {
            language: self.language.clone().unwrap_or_else(|| config.language.clone()),
            psm: self.psm.unwrap_or(config.psm),
            oem: self.oem.unwrap_or(config.oem),
            enhance: self.enhance_quality.unwrap_or(config.enhance_quality),
            region: None,
        };
        validate_request(&request)?;
        Ok(request)
    }
}

fn validate_request(request: &RecognitionRequest) -> Result<()> {
    validate_language_code(&request.language)?;
    validate_psm(request.psm)?;
    validate_oem(request.oem)?;
    if let Some(region) = &request.region {
        validate_region(region)?;
    }
    Ok(())
}

/// Preprocessing hints for [`Recognizer::ocr_with_preprocessing`].
///
/// Hints only select engine parameters; pixels are never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct PreprocessingOptions {
    /// Use the adaptive threshold strategy
    #[serde(default)]
    pub enhance_contrast: bool,
    /// Enable noise rejection
    #[serde(default)]
    pub remove_noise: bool,
    /// Request skew correction
    #[serde(default)]
    pub deskew: bool,
    /// Scale factor hint (default 1.0)
    #[serde(default)]
    pub scale: Option<f64>,
}

impl PreprocessingOptions {
    pub fn strategy(&self) -> ThresholdStrategy {
        if self.enhance_contrast {
            ThresholdStrategy::Adaptive
        } else {
            ThresholdStrategy::Otsu
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(scale) = self.scale
            && (!scale.is_finite() || scale <= 0.0)
        {
            return Err(AdaptiveOcrError::validation(format!(
                "Invalid scale: {}. Must be a positive number",
                scale
            )));
        }
        Ok(())
    }

    /// Labels of the applied steps, in a stable order.
    pub fn applied_steps(&self) -> Vec<String> {
        let mut steps = Vec::new();
        if self.enhance_contrast {
            steps.push("contrast enhancement".to_string());
        }
        if self.remove_noise {
            steps.push("noise removal".to_string());
        }
        if self.deskew {
            steps.push("deskew".to_string());
        }
        if let Some(scale) = self.scale
            && scale != 1.0
        {
            steps.push(format!("scale {}x", scale));
        }
        steps.push("enhanced recognition".to_string());
        steps.push(format!("{} threshold strategy", self.strategy()));
        steps
    }
}

/// Entry point for every recognition operation.
#[derive(Clone)]
pub struct Recognizer {
    factory: Arc<dyn EngineFactory>,
    config: AdaptiveOcrConfig,
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("engine", &self.factory.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Recognizer {
    pub fn new(factory: Arc<dyn EngineFactory>, config: AdaptiveOcrConfig) -> Self {
        Self { factory, config }
    }

    /// Recognizer backed by the native Tesseract engine.
    ///
    /// Without the `tesseract` feature every operation that needs the engine fails with
    /// `MissingDependency`.
    pub fn native(config: AdaptiveOcrConfig) -> Self {
        let factory = native_factory(config.tessdata_dir.clone());
        Self::new(factory, config)
    }

    pub fn config(&self) -> &AdaptiveOcrConfig {
        &self.config
    }

    fn run_adaptive(&self, image: &ImageSource, request: &RecognitionRequest) -> Result<AdaptiveOutcome> {
        tracing::debug!(
            image = %image.describe(),
            language = %request.language,
            psm = request.psm,
            enhance = request.enhance,
            "starting recognition"
        );
        with_session(self.factory.as_ref(), &request.language, request.oem, |engine| {
            recognize_adaptive(engine, image, request)
        })
    }

    /// Recognize an image file.
    pub fn ocr_image(&self, image_path: impl AsRef<Path>, options: &RecognizeOptions) -> Result<RecognitionReport> {
        let request = options.resolve(&self.config)?;
        let image = image_from_path(image_path)?;
        let outcome = self.run_adaptive(&image, &request)?;
        Ok(RecognitionReport::from_outcome(
            &outcome,
            &request.language,
            request.psm,
            request.enhance,
        ))
    }

    /// Recognize a base64-encoded image, with or without a `data:` URL prefix.
    pub fn ocr_image_base64(&self, payload: &str, options: &RecognizeOptions) -> Result<RecognitionReport> {
        let request = options.resolve(&self.config)?;
        let image = image_from_base64(payload)?;
        let outcome = self.run_adaptive(&image, &request)?;
        Ok(RecognitionReport::from_outcome(
            &outcome,
            &request.language,
            request.psm,
            request.enhance,
        ))
    }

    /// Single enhanced pass with the strategy implied by the preprocessing hints.
    pub fn ocr_with_preprocessing(
        &self,
        image_path: impl AsRef<Path>,
        options: &RecognizeOptions,
        preprocessing: &PreprocessingOptions,
    ) -> Result<RecognitionReport> {
        let request = options.resolve(&self.config)?;
        preprocessing.validate()?;
        let image = image_from_path(image_path)?;

        let strategy = preprocessing.strategy();
        let params = EngineParams::build(request.psm, request.oem, &request.language, true, strategy);

        let outcome = with_session(self.factory.as_ref(), &request.language, request.oem, |engine| {
            recognize_once(engine, &image, None, &params)
        })?;

        Ok(
            RecognitionReport::from_outcome(&outcome, &request.language, request.psm, true)
                .with_preprocessing(preprocessing.applied_steps(), strategy),
        )
    }

    /// Recognize a rectangular region. Page segmentation is forced to a single block.
    pub fn ocr_region(
        &self,
        image_path: impl AsRef<Path>,
        region: Region,
        language: Option<&str>,
        enhance_quality: Option<bool>,
    ) -> Result<RecognitionReport> {
        let request = RecognitionRequest {
            language: language.map_or_else(|| self.config.language.clone(), str::to_string),
            psm: PSM_SINGLE_BLOCK,
            oem: OEM_DEFAULT,
            enhance: enhance_quality.unwrap_or(self.config.enhance_quality),
            region: Some(region),
        };
        validate_request(&request)?;
        let image = image_from_path(image_path)?;

        let outcome = self.run_adaptive(&image, &request)?;
        Ok(
            RecognitionReport::from_outcome(&outcome, &request.language, request.psm, request.enhance)
                .with_region(region),
        )
    }

    fn batch_item(&self, path: &Path, request: &RecognitionRequest) -> BatchItem {
        let label = path.display().to_string();
        let outcome = image_from_path(path).and_then(|image| self.run_adaptive(&image, request));
        match outcome {
            Ok(outcome) => BatchItem::success(label, &outcome),
            Err(err) => {
                tracing::warn!(path = %label, error = %err, "batch item failed");
                BatchItem::failure(label, err)
            }
        }
    }

    fn finish_batch(items: Vec<BatchItem>, enhanced: bool) -> BatchReport {
        let report = BatchReport::from_items(items, enhanced);
        tracing::info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "batch recognition complete"
        );
        report
    }

    /// Recognize several image files one after another. Item failures are recorded and never
    /// abort the batch.
    pub fn ocr_batch<P: AsRef<Path>>(&self, image_paths: &[P], options: &RecognizeOptions) -> Result<BatchReport> {
        let request = options.resolve(&self.config)?;
        let items = image_paths
            .iter()
            .map(|path| self.batch_item(path.as_ref(), &request))
            .collect();
        Ok(Self::finish_batch(items, request.enhance))
    }

    /// Recognize several image files concurrently, each on its own engine session.
    ///
    /// Results keep input order. Concurrency is bounded by `max_concurrent_batch`, never below one.
    #[cfg(feature = "tokio-runtime")]
    pub async fn ocr_batch_concurrent(&self, image_paths: Vec<PathBuf>, options: &RecognizeOptions) -> Result<BatchReport> {
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        let request = Arc::new(options.resolve(&self.config)?);
        // a zero permit count would park every task forever
        let max_concurrent = self
            .config
            .max_concurrent_batch
            .unwrap_or_else(|| num_cpus::get() * 2)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        let mut tasks = JoinSet::new();
        for (index, path) in image_paths.into_iter().enumerate() {
            let recognizer = self.clone();
            let request = Arc::clone(&request);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AdaptiveOcrError::Other(format!("Batch semaphore closed: {}", e)))?;
                let item = tokio::task::spawn_blocking(move || recognizer.batch_item(&path, &request))
                    .await
                    .map_err(|e| AdaptiveOcrError::Other(format!("Task panicked: {}", e)))?;
                Ok::<_, AdaptiveOcrError>((index, item))
            });
        }

        let mut items: Vec<Option<BatchItem>> = vec![None; tasks.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, item) = joined.map_err(|e| AdaptiveOcrError::Other(format!("Task panicked: {}", e)))??;
            items[index] = Some(item);
        }

        Ok(Self::finish_batch(items.into_iter().flatten().collect(), request.enhance))
    }
}
