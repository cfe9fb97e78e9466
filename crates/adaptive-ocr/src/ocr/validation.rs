//! Parameter validation and the advertised language list.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::error::OcrError;
use super::strategy::{MAX_OEM, MAX_PSM};
use crate::types::Region;

/// Traineddata codes accepted by the engine.
const LANGUAGE_CODES: &[&str] = &[
    "afr", "amh", "ara", "asm", "aze", "aze_cyrl", "bel", "ben", "bod", "bos", "bre", "bul", "cat",
    "ceb", "ces", "chi_sim", "chi_tra", "chr", "cos", "cym", "dan", "deu", "div", "dzo", "ell",
    "eng", "enm", "epo", "equ", "est", "eus", "fao", "fas", "fil", "fin", "fra", "frk", "frm",
    "fry", "gla", "gle", "glg", "grc", "guj", "hat", "heb", "hin", "hrv", "hun", "hye", "iku",
    "ind", "isl", "ita", "ita_old", "jav", "jpn", "kan", "kat", "kat_old", "kaz", "khm", "kir",
    "kmr", "kor", "lao", "lat", "lav", "lit", "ltz", "mal", "mar", "mkd", "mlt", "mon", "mri",
    "msa", "mya", "nep", "nld", "nor", "oci", "ori", "osd", "pan", "pol", "por", "pus", "que",
    "ron", "rus", "san", "sin", "slk", "slv", "snd", "spa", "spa_old", "sqi", "srp", "srp_latn",
    "sun", "swa", "swe", "syr", "tam", "tat", "tel", "tgk", "tha", "tir", "ton", "tur", "uig",
    "ukr", "urd", "uzb", "uzb_cyrl", "vie", "yid", "yor",
];

pub static TESSERACT_SUPPORTED_LANGUAGE_CODES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| LANGUAGE_CODES.iter().copied().collect());

/// Languages listed by `get_supported_languages`, as `(code, name)`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("chi_sim", "Simplified Chinese"),
    ("chi_tra", "Traditional Chinese"),
    ("jpn", "Japanese"),
    ("kor", "Korean"),
    ("fra", "French"),
    ("deu", "German"),
    ("spa", "Spanish"),
    ("rus", "Russian"),
    ("ara", "Arabic"),
    ("hin", "Hindi"),
    ("tha", "Thai"),
    ("vie", "Vietnamese"),
    ("por", "Portuguese"),
    ("ita", "Italian"),
    ("nld", "Dutch"),
    ("pol", "Polish"),
    ("tur", "Turkish"),
];

/// Validate a `+`-joined language specification such as `eng+chi_sim`.
pub fn validate_language_code(lang_code: &str) -> Result<(), OcrError> {
    if lang_code.trim().is_empty() {
        return Err(OcrError::InvalidLanguageCode("Language code must not be empty".to_string()));
    }
    for code in lang_code.split('+') {
        if !TESSERACT_SUPPORTED_LANGUAGE_CODES.contains(code) {
            return Err(OcrError::InvalidLanguageCode(format!(
                "Language code '{}' is not supported by Tesseract",
                code
            )));
        }
    }
    Ok(())
}

pub fn validate_psm(psm: u8) -> Result<(), OcrError> {
    if psm > MAX_PSM {
        return Err(OcrError::InvalidConfiguration(format!(
            "Invalid psm: {}. Must be between 0 and {}",
            psm, MAX_PSM
        )));
    }
    Ok(())
}

pub fn validate_oem(oem: u8) -> Result<(), OcrError> {
    if oem > MAX_OEM {
        return Err(OcrError::InvalidConfiguration(format!(
            "Invalid oem: {}. Must be between 0 and {}",
            oem, MAX_OEM
        )));
    }
    Ok(())
}

pub fn validate_region(region: &Region) -> Result<(), OcrError> {
    if region.width == 0 || region.height == 0 {
        return Err(OcrError::InvalidConfiguration(format!(
            "Invalid region: width and height must be positive (got {}x{})",
            region.width, region.height
        )));
    }
    if region.x.checked_add(region.width).is_none() || region.y.checked_add(region.height).is_none() {
        return Err(OcrError::InvalidConfiguration("Invalid region: coordinates overflow".to_string()));
    }
    Ok(())
}
