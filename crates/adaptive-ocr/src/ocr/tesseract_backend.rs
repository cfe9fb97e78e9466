//! Native Tesseract engine.
//!
//! Wraps `kreuzberg_tesseract::TesseractAPI` behind [`RecognitionEngine`]. A session initializes
//! one API handle for its language; the handle is dropped on release.

use std::env;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};

use super::engine::{EngineFactory, RecognitionEngine};
use super::error::OcrError;
use super::strategy::{EngineParams, OEM_DEFAULT};
use super::tsv::parse_tsv;
use crate::Result;
use crate::types::{ImageSource, RecognitionResult, Region};

const TESSDATA_FALLBACK_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// Variables applied through dedicated API calls, or fixed when the session is created.
const SKIPPED_VARIABLES: &[&str] = &["tessedit_pageseg_mode", "tessedit_ocr_engine_mode"];

/// `TesseractAPI::init` takes no engine mode, so sessions always run the default one.
fn ensure_supported_oem(oem: u8) -> std::result::Result<(), OcrError> {
    if oem != OEM_DEFAULT {
        return Err(OcrError::InvalidConfiguration(format!(
            "OEM {} is not supported by the native engine; only OEM {} (default) is available",
            oem, OEM_DEFAULT
        )));
    }
    Ok(())
}

/// Resolve the tessdata directory: `TESSDATA_PREFIX`, then the configured directory, then
/// well-known install locations.
pub fn resolve_tessdata_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(prefix) = env::var_os("TESSDATA_PREFIX") {
        return Some(PathBuf::from(prefix));
    }
    if let Some(dir) = configured {
        return Some(dir.to_path_buf());
    }
    TESSDATA_FALLBACK_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Factory for [`TesseractEngine`] sessions.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngineFactory {
    tessdata_dir: Option<PathBuf>,
}

impl TesseractEngineFactory {
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        Self { tessdata_dir }
    }
}

impl EngineFactory for TesseractEngineFactory {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn create_session(&self, language: &str, oem: u8) -> Result<Box<dyn RecognitionEngine>> {
        let engine = TesseractEngine::init(self.tessdata_dir.as_deref(), language, oem)?;
        Ok(Box::new(engine))
    }
}

/// One initialized Tesseract handle.
pub struct TesseractEngine {
    api: Option<TesseractAPI>,
    language: String,
}

impl TesseractEngine {
    pub fn init(tessdata_dir: Option<&Path>, language: &str, oem: u8) -> Result<Self> {
        // An empty or missing language makes the native library abort instead of returning an error
        if language.trim().is_empty() {
            return Err(OcrError::EngineInitializationFailed(
                "Language cannot be empty. Please specify a valid language code (e.g., 'eng')".to_string(),
            )
            .into());
        }
        ensure_supported_oem(oem)?;

        let tessdata_path = resolve_tessdata_dir(tessdata_dir)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !tessdata_path.is_empty() {
            for lang in language.split('+').map(str::trim).filter(|l| !l.is_empty()) {
                let traineddata = Path::new(&tessdata_path).join(format!("{}.traineddata", lang));
                if !traineddata.exists() {
                    return Err(OcrError::EngineInitializationFailed(format!(
                        "Language '{}' not found. Traineddata file does not exist: {}",
                        lang,
                        traineddata.display()
                    ))
                    .into());
                }
            }
        }

        let api = TesseractAPI::new();
        api.init(&tessdata_path, language).map_err(|e| {
            OcrError::EngineInitializationFailed(format!("Failed to initialize language '{}': {}", language, e))
        })?;

        tracing::debug!(
            language,
            oem,
            tessdata = %tessdata_path,
            version = %TesseractAPI::version(),
            "tesseract initialized"
        );

        Ok(Self {
            api: Some(api),
            language: language.to_string(),
        })
    }

    fn api(&self) -> std::result::Result<&TesseractAPI, OcrError> {
        self.api
            .as_ref()
            .ok_or_else(|| OcrError::ProcessingFailed("Engine session already released".to_string()))
    }
}

fn load_image(image: &ImageSource) -> Result<DynamicImage> {
    let bytes = match image {
        ImageSource::Path(path) => std::fs::read(path)?,
        ImageSource::Bytes(bytes) => bytes.clone(),
    };
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| OcrError::ImageProcessingFailed(format!("Failed to decode image: {}", e)))?;
    Ok(decoded)
}

/// Crop to a region, clipped to the image bounds.
fn crop_region(img: &DynamicImage, region: &Region) -> std::result::Result<DynamicImage, OcrError> {
    let (width, height) = (img.width(), img.height());
    if region.x >= width || region.y >= height {
        return Err(OcrError::ImageProcessingFailed(format!(
            "Region origin ({}, {}) lies outside the {}x{} image",
            region.x, region.y, width, height
        )));
    }
    let crop_width = region.width.min(width - region.x);
    let crop_height = region.height.min(height - region.y);
    Ok(img.crop_imm(region.x, region.y, crop_width, crop_height))
}

impl RecognitionEngine for TesseractEngine {
    fn configure(&mut self, params: &EngineParams) -> Result<()> {
        let api = self.api()?;

        api.set_page_seg_mode(TessPageSegMode::from_int(params.psm as i32))
            .map_err(|e| OcrError::InvalidConfiguration(format!("Failed to set PSM mode: {}", e)))?;

        for (name, value) in params.variables() {
            if SKIPPED_VARIABLES.contains(&name) {
                continue;
            }
            api.set_variable(name, &value)
                .map_err(|e| OcrError::InvalidConfiguration(format!("Failed to set {}: {}", name, e)))?;
        }
        Ok(())
    }

    fn recognize(&mut self, image: &ImageSource, region: Option<&Region>) -> Result<RecognitionResult> {
        let decoded = load_image(image)?;
        let target = match region {
            Some(region) => crop_region(&decoded, region)?,
            None => decoded,
        };

        let rgb_image = target.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let bytes_per_pixel = 3;
        let bytes_per_line = width * bytes_per_pixel;

        let api = self.api()?;
        api.set_image(
            rgb_image.as_raw(),
            width as i32,
            height as i32,
            bytes_per_pixel as i32,
            bytes_per_line as i32,
        )
        .map_err(|e| OcrError::ProcessingFailed(format!("Failed to set image: {}", e)))?;

        api.recognize()
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to recognize text: {}", e)))?;

        let tsv = api
            .get_tsv_text(0)
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to extract TSV: {}", e)))?;
        let text = api
            .get_utf8_text()
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to extract text: {}", e)))?;

        let mut result = parse_tsv(&tsv, text.trim())?;

        if let Some(region) = region {
            let (dx, dy) = (region.x as i32, region.y as i32);
            for word in &mut result.words {
                word.bbox = word.bbox.translate(dx, dy);
            }
            for line in &mut result.lines {
                line.bbox = line.bbox.translate(dx, dy);
            }
        }

        Ok(result)
    }

    fn release(&mut self) -> Result<()> {
        if self.api.take().is_none() {
            return Err(OcrError::ReleaseFailed(format!("Session for '{}' was already released", self.language)).into());
        }
        tracing::debug!(language = %self.language, "tesseract session released");
        Ok(())
    }
}
