//! Server and CLI configuration.
//!
//! Loaded from TOML, YAML or JSON. [`AdaptiveOcrConfig::discover`] walks up from the current
//! directory looking for `adaptive-ocr.toml`.

use crate::ocr::validation::{validate_language_code, validate_oem, validate_psm};
use crate::types::OutputFormat;
use crate::{AdaptiveOcrError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for by [`AdaptiveOcrConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "adaptive-ocr.toml";

/// Default recognition settings. Per-request parameters override each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveOcrConfig {
    /// Language code(s), `+`-joined
    #[serde(default = "default_language")]
    pub language: String,

    /// Page segmentation mode (0-13)
    #[serde(default = "default_psm")]
    pub psm: u8,

    /// Engine mode (0-3)
    #[serde(default = "default_oem")]
    pub oem: u8,

    /// Run the multi-pass policy on weak results
    #[serde(default)]
    pub enhance_quality: bool,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Tessdata directory for the native engine
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,

    /// Upper bound on concurrently recognized batch images (default: twice the CPU count)
    #[serde(default)]
    pub max_concurrent_batch: Option<usize>,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_psm() -> u8 {
    3
}

fn default_oem() -> u8 {
    3
}

impl Default for AdaptiveOcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            psm: default_psm(),
            oem: default_oem(),
            enhance_quality: false,
            output_format: OutputFormat::default(),
            tessdata_dir: None,
            max_concurrent_batch: None,
        }
    }
}

impl AdaptiveOcrConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AdaptiveOcrError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content).map_err(|e| {
            AdaptiveOcrError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AdaptiveOcrError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, choosing the format from the file extension. Unknown extensions are
    /// read as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(AdaptiveOcrError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "discovered configuration file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Check value ranges and language codes.
    pub fn validate(&self) -> Result<()> {
        validate_psm(self.psm)?;
        validate_oem(self.oem)?;
        validate_language_code(&self.language)?;
        if self.max_concurrent_batch == Some(0) {
            return Err(AdaptiveOcrError::validation("max_concurrent_batch must be at least 1"));
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        AdaptiveOcrError::validation(format!("Failed to read config file {}: {}", path.display(), e))
    })
}
