//! Recognition engine contract.
//!
//! An engine session is configured, asked to recognize one or more times, and released exactly
//! once. Sessions are never shared between top-level requests: every request obtains its own from
//! an [`EngineFactory`].

use std::sync::Arc;

use crate::ocr::strategy::EngineParams;
use crate::{AdaptiveOcrError, Result};
use crate::types::{ImageSource, RecognitionResult, Region};

/// One engine session.
///
/// Calls block until the engine returns. Implementations must be `Send` so a session can be moved
/// onto a blocking worker thread.
pub trait RecognitionEngine: Send {
    /// Apply a parameter bundle to the session.
    fn configure(&mut self, params: &EngineParams) -> Result<()>;

    /// Recognize an image, optionally restricted to a pixel region.
    fn recognize(&mut self, image: &ImageSource, region: Option<&Region>) -> Result<RecognitionResult>;

    /// Tear down engine resources.
    fn release(&mut self) -> Result<()>;
}

/// Creates engine sessions for a language and engine mode.
pub trait EngineFactory: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    fn create_session(&self, language: &str, oem: u8) -> Result<Box<dyn RecognitionEngine>>;
}

/// Factory for the native engine, or one that reports the missing feature.
pub fn native_factory(tessdata_dir: Option<std::path::PathBuf>) -> Arc<dyn EngineFactory> {
    #[cfg(feature = "tesseract")]
    {
        Arc::new(super::tesseract_backend::TesseractEngineFactory::new(tessdata_dir))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        let _ = tessdata_dir;
        Arc::new(UnavailableEngineFactory)
    }
}

/// Stands in for the native engine when it was not compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEngineFactory;

impl EngineFactory for UnavailableEngineFactory {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn create_session(&self, _language: &str, _oem: u8) -> Result<Box<dyn RecognitionEngine>> {
        Err(AdaptiveOcrError::MissingDependency(
            "Native OCR engine not available. Rebuild with the 'tesseract' feature".to_string(),
        ))
    }
}

/// Run `work` against a fresh session and release it on every exit path.
///
/// The work error wins over a release error; a release error alone still fails the call.
pub fn with_session<T, F>(factory: &dyn EngineFactory, language: &str, oem: u8, work: F) -> Result<T>
where
    F: FnOnce(&mut dyn RecognitionEngine) -> Result<T>,
{
    let mut session = factory.create_session(language, oem)?;
    tracing::debug!(engine = factory.name(), language, oem, "engine session created");

    let outcome = work(session.as_mut());
    let released = session.release();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            tracing::warn!(error = %release_err, "engine release failed after recognition error");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        releases: Arc<AtomicUsize>,
        fail_release: bool,
    }

    impl RecognitionEngine for CountingEngine {
        fn configure(&mut self, _params: &EngineParams) -> Result<()> {
            Ok(())
        }

        fn recognize(&mut self, _image: &ImageSource, _region: Option<&Region>) -> Result<RecognitionResult> {
            Ok(RecognitionResult::default())
        }

        fn release(&mut self) -> Result<()> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                return Err(AdaptiveOcrError::ocr("release failed"));
            }
            Ok(())
        }
    }

    struct CountingFactory {
        releases: Arc<AtomicUsize>,
        fail_release: bool,
    }

    impl EngineFactory for CountingFactory {
        fn name(&self) -> &str {
            "counting"
        }

        fn create_session(&self, _language: &str, _oem: u8) -> Result<Box<dyn RecognitionEngine>> {
            Ok(Box::new(CountingEngine {
                releases: Arc::clone(&self.releases),
                fail_release: self.fail_release,
            }))
        }
    }

    fn factory(fail_release: bool) -> CountingFactory {
        CountingFactory {
            releases: Arc::new(AtomicUsize::new(0)),
            fail_release,
        }
    }

    #[test]
    fn test_release_on_success() {
        let factory = factory(false);
        let value = with_session(&factory, "eng", 3, |_| Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(factory.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_on_work_error() {
        let factory = factory(false);
        let result: Result<()> = with_session(&factory, "eng", 3, |_| Err(AdaptiveOcrError::ocr("pass failed")));
        assert!(result.unwrap_err().to_string().contains("pass failed"));
        assert_eq!(factory.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_error_surfaces_when_work_succeeds() {
        let factory = factory(true);
        let result = with_session(&factory, "eng", 3, |_| Ok(()));
        assert!(result.unwrap_err().to_string().contains("release failed"));
        assert_eq!(factory.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_factory_reports_missing_dependency() {
        let err = UnavailableEngineFactory.create_session("eng", 3).err().unwrap();
        assert!(matches!(err, AdaptiveOcrError::MissingDependency(_)));
    }

    #[test]
    fn test_work_error_wins_over_release_error() {
        let factory = factory(true);
        let result: Result<()> = with_session(&factory, "eng", 3, |_| Err(AdaptiveOcrError::ocr("pass failed")));
        assert!(result.unwrap_err().to_string().contains("pass failed"));
    }
}
