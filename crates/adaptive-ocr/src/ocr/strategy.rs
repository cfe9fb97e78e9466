//! Strategy catalog: thresholding strategies and engine parameter bundles.
//!
//! Everything here is a pure mapping from request settings to a typed parameter set. The engine
//! adapter renders a bundle into engine variables with [`EngineParams::variables`].

use serde::{Deserialize, Serialize};

/// Page segmentation mode: fully automatic layout analysis.
pub const PSM_AUTO: u8 = 3;
/// Page segmentation mode: single uniform block of text.
pub const PSM_SINGLE_BLOCK: u8 = 6;
pub const MAX_PSM: u8 = 13;
pub const MAX_OEM: u8 = 3;
/// Engine mode: default (LSTM where available).
pub const OEM_DEFAULT: u8 = 3;

/// Minimum line size for CJK-family languages.
pub const CJK_MIN_LINE_SIZE: f64 = 1.5;
pub const DEFAULT_MIN_LINE_SIZE: f64 = 2.0;

/// Language code marker identifying ideographic (Chinese) traineddata, e.g. `chi_sim`.
const CJK_LANGUAGE_MARKER: &str = "chi";

/// Binarization strategy requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdStrategy {
    /// Global Otsu threshold, general purpose.
    #[default]
    Otsu,
    /// Local adaptive threshold, for uneven illumination.
    Adaptive,
    /// Sauvola local-statistics threshold, for low contrast.
    Sauvola,
}

impl ThresholdStrategy {
    /// Resolve a strategy by name. Unknown names fall back to Otsu.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "adaptive" => ThresholdStrategy::Adaptive,
            "sauvola" => ThresholdStrategy::Sauvola,
            _ => ThresholdStrategy::Otsu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdStrategy::Otsu => "otsu",
            ThresholdStrategy::Adaptive => "adaptive",
            ThresholdStrategy::Sauvola => "sauvola",
        }
    }
}

impl std::fmt::Display for ThresholdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine parameter implementing a threshold strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    pub strategy: ThresholdStrategy,
    /// Tesseract `thresholding_method`: 0 Otsu, 1 Leptonica adaptive Otsu, 2 Sauvola.
    pub thresholding_method: u8,
}

/// Look up the threshold parameter for a strategy name.
pub fn threshold_params(strategy_name: &str) -> ThresholdParams {
    let strategy = ThresholdStrategy::from_name(strategy_name);
    let thresholding_method = match strategy {
        ThresholdStrategy::Otsu => 0,
        ThresholdStrategy::Adaptive => 1,
        ThresholdStrategy::Sauvola => 2,
    };
    ThresholdParams {
        strategy,
        thresholding_method,
    }
}

/// Extra tuning applied when quality enhancement is requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTuning {
    pub threshold: ThresholdParams,
    pub dict_correction: bool,
    pub bigram_correction: bool,
    pub heavy_noise_reduction: bool,
    pub reject_noise_words: bool,
    pub reject_noise_rows: bool,
    pub reject_bad_quality_words: bool,
    pub min_line_size: f64,
}

/// Parameter bundle for one pass, independent of page layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    pub preserve_interword_spaces: bool,
    pub char_blacklist: String,
    /// `None` when only the baseline applies.
    pub enhanced: Option<EnhancedTuning>,
}

impl ParamSet {
    pub fn baseline() -> Self {
        Self {
            preserve_interword_spaces: true,
            char_blacklist: String::new(),
            enhanced: None,
        }
    }

    /// Strategy in effect, Otsu for the baseline.
    pub fn strategy(&self) -> ThresholdStrategy {
        self.enhanced
            .map(|tuning| tuning.threshold.strategy)
            .unwrap_or_default()
    }
}

/// Build the parameter bundle for a language, enhancement flag and strategy name.
pub fn enhanced_params(language: &str, enhance: bool, strategy_name: &str) -> ParamSet {
    let mut params = ParamSet::baseline();
    if !enhance {
        return params;
    }

    let min_line_size = if language.contains(CJK_LANGUAGE_MARKER) {
        CJK_MIN_LINE_SIZE
    } else {
        DEFAULT_MIN_LINE_SIZE
    };

    params.enhanced = Some(EnhancedTuning {
        threshold: threshold_params(strategy_name),
        dict_correction: true,
        bigram_correction: true,
        heavy_noise_reduction: true,
        reject_noise_words: true,
        reject_noise_rows: true,
        reject_bad_quality_words: true,
        min_line_size,
    });
    params
}

/// Full engine configuration for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    pub psm: u8,
    pub oem: u8,
    pub params: ParamSet,
}

impl EngineParams {
    pub fn build(psm: u8, oem: u8, language: &str, enhance: bool, strategy: ThresholdStrategy) -> Self {
        Self {
            psm,
            oem,
            params: enhanced_params(language, enhance, strategy.as_str()),
        }
    }

    /// Same bundle with a different page segmentation mode.
    pub fn with_psm(&self, psm: u8) -> Self {
        Self {
            psm,
            oem: self.oem,
            params: self.params.clone(),
        }
    }

    pub fn strategy(&self) -> ThresholdStrategy {
        self.params.strategy()
    }

    /// Render as engine variable assignments, in application order.
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("tessedit_pageseg_mode", self.psm.to_string()),
            ("tessedit_ocr_engine_mode", self.oem.to_string()),
            ("preserve_interword_spaces", flag(self.params.preserve_interword_spaces)),
            ("tessedit_char_blacklist", self.params.char_blacklist.clone()),
        ];

        if let Some(tuning) = &self.params.enhanced {
            vars.extend([
                ("thresholding_method", tuning.threshold.thresholding_method.to_string()),
                ("tessedit_enable_dict_correction", flag(tuning.dict_correction)),
                ("tessedit_enable_bigram_correction", flag(tuning.bigram_correction)),
                ("textord_heavy_nr", flag(tuning.heavy_noise_reduction)),
                ("textord_noise_rejwords", flag(tuning.reject_noise_words)),
                ("textord_noise_rejrows", flag(tuning.reject_noise_rows)),
                ("tessedit_reject_bad_qual_wds", flag(tuning.reject_bad_quality_words)),
                ("textord_min_linesize", format!("{:.1}", tuning.min_line_size)),
            ]);
        }

        vars
    }
}

fn flag(on: bool) -> String {
    let value = if on { "1" } else { "0" };
    value.to_string()
}
