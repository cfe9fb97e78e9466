//! Core data types shared by the recognition pipeline.
//!
//! Engine output ([`RecognitionResult`], [`Word`], [`Line`]) is treated as immutable once a pass
//! returns it. The merger builds fresh values instead of editing a pass in place.

#[cfg(feature = "mcp")]
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pixel bounding box, `(x0, y0)` top-left and `(x1, y1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingBox {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Top-left corner, used as the slot key when fusing passes.
    pub fn origin(&self) -> (i32, i32) {
        (self.x0, self.y0)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}

/// A recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// A recognized text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Output of one engine pass, or of the merger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    /// Overall confidence (0-100).
    pub confidence: f64,
    pub words: Vec<Word>,
    pub lines: Vec<Line>,
    /// Set only on results produced by fusing several passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_count: Option<usize>,
}

impl RecognitionResult {
    pub fn is_merged(&self) -> bool {
        self.merge_count.is_some()
    }
}

/// Rectangular pixel region of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct Region {
    /// Left edge (pixels)
    pub x: u32,
    /// Top edge (pixels)
    pub y: u32,
    /// Region width (pixels)
    pub width: u32,
    /// Region height (pixels)
    pub height: u32,
}

/// Image handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Human-readable label for logs and reports.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

/// Response rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Invalid output_format: '{}'. Must be one of: text, json", other)),
        }
    }
}
