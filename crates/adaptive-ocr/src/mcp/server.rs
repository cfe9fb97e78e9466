//! MCP server implementation for Adaptive OCR.
//!
//! Each tool resolves its parameters against the server configuration and runs the blocking
//! recognition pipeline on tokio's blocking pool.

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};

use crate::core::config::AdaptiveOcrConfig;
use crate::core::format::render_languages;
use crate::core::recognizer::{PreprocessingOptions, RecognizeOptions, Recognizer};
use crate::types::{OutputFormat, Region};
use crate::AdaptiveOcrError;
use std::path::PathBuf;

/// Request parameters for `ocr_image`.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct OcrImageParams {
    /// Path to the image file
    pub image_path: String,
    /// Language code(s), e.g. "eng" or "eng+chi_sim"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Page segmentation mode (0-13)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psm: Option<u8>,
    /// OCR engine mode (0-3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oem: Option<u8>,
    /// Retry with alternative strategies and merge when quality is low
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_quality: Option<bool>,
    /// Response format: text or json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

/// Request parameters for `ocr_image_base64`.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct OcrImageBase64Params {
    /// Base64-encoded image, optionally with a data:image/...;base64, prefix
    pub image_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psm: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oem: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_quality: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

/// Request parameters for `ocr_with_preprocessing`.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct OcrWithPreprocessingParams {
    /// Path to the image file
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psm: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oem: Option<u8>,
    /// Preprocessing hints
    #[serde(default)]
    pub preprocessing: PreprocessingOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

/// Request parameters for `ocr_batch`.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct OcrBatchParams {
    /// Paths to the image files
    pub image_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psm: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oem: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_quality: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

/// Request parameters for `ocr_region`.
#[derive(Debug, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct OcrRegionParams {
    /// Path to the image file
    pub image_path: String,
    /// Pixel region to recognize
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_quality: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

fn with_message_and_source(
    prefix: &str,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> String {
    let mut error_message = format!("{}: {}", prefix, message);
    if let Some(src) = source {
        error_message.push_str(&format!(" (caused by: {})", src));
    }
    error_message
}

/// Map Adaptive OCR errors to MCP error responses.
///
/// - `Validation`, `NotFound` and `MissingDependency` → `INVALID_PARAMS` (-32602)
/// - everything else → `INTERNAL_ERROR` (-32603)
#[doc(hidden)]
pub fn map_adaptive_error_to_mcp(error: AdaptiveOcrError) -> McpError {
    match error {
        AdaptiveOcrError::Validation { message, source } => {
            McpError::invalid_params(with_message_and_source("Validation error", message, source), None)
        }

        AdaptiveOcrError::NotFound { path } => {
            McpError::invalid_params(format!("Image file not found: {}", path.display()), None)
        }

        AdaptiveOcrError::MissingDependency(dep) => McpError::invalid_params(
            format!("Missing required dependency: {}", dep),
            None,
        ),

        AdaptiveOcrError::Io(io_err) => McpError::internal_error(format!("System I/O error: {}", io_err), None),

        AdaptiveOcrError::Ocr { message, source } => {
            McpError::internal_error(with_message_and_source("OCR processing error", message, source), None)
        }

        AdaptiveOcrError::ImageProcessing { message, source } => {
            McpError::internal_error(with_message_and_source("Image processing error", message, source), None)
        }

        AdaptiveOcrError::Serialization { message, source } => {
            McpError::internal_error(with_message_and_source("Serialization error", message, source), None)
        }

        AdaptiveOcrError::Other(msg) => McpError::internal_error(msg, None),
    }
}

/// Run blocking recognition work off the async runtime.
async fn run_blocking<F>(recognizer: &Recognizer, work: F) -> Result<CallToolResult, McpError>
where
    F: FnOnce(&Recognizer) -> crate::Result<String> + Send + 'static,
{
    let recognizer = recognizer.clone();
    let response = tokio::task::spawn_blocking(move || work(&recognizer))
        .await
        .map_err(|e| McpError::internal_error(format!("Recognition task failed: {}", e), None))?
        .map_err(map_adaptive_error_to_mcp)?;

    Ok(CallToolResult::success(vec![Content::text(response)]))
}

/// Adaptive OCR MCP server.
///
/// Per-request parameters override the server configuration.
#[derive(Clone)]
pub struct AdaptiveOcrMcp {
    tool_router: ToolRouter<AdaptiveOcrMcp>,
    recognizer: Recognizer,
}

#[tool_router]
impl AdaptiveOcrMcp {
    /// Create a server with the native engine and a discovered configuration.
    ///
    /// Falls back to the default configuration if no `adaptive-ocr.toml` is found.
    pub fn new() -> crate::Result<Self> {
        let config = match AdaptiveOcrConfig::discover()? {
            Some(config) => {
                tracing::info!("Loaded configuration from discovered file");
                config
            }
            None => {
                tracing::info!("No config file found, using default configuration");
                AdaptiveOcrConfig::default()
            }
        };

        Ok(Self::with_config(config))
    }

    /// Create a server with the native engine and an explicit configuration.
    pub fn with_config(config: AdaptiveOcrConfig) -> Self {
        Self::with_recognizer(Recognizer::native(config))
    }

    /// Create a server around an existing recognizer.
    pub fn with_recognizer(recognizer: Recognizer) -> Self {
        Self {
            tool_router: Self::tool_router(),
            recognizer,
        }
    }

    fn format_or_default(&self, format: Option<OutputFormat>) -> OutputFormat {
        format.unwrap_or(self.recognizer.config().output_format)
    }

    #[tool(
        description = "Recognize text in an image file. With enhance_quality, low-quality results are retried with alternative segmentation and threshold strategies and merged."
    )]
    async fn ocr_image(&self, Parameters(params): Parameters<OcrImageParams>) -> Result<CallToolResult, McpError> {
        let format = self.format_or_default(params.output_format);
        let options = RecognizeOptions {
            language: params.language,
            psm: params.psm,
            oem: params.oem,
            enhance_quality: params.enhance_quality,
        };
        let path = params.image_path;

        run_blocking(&self.recognizer, move |recognizer| {
            recognizer.ocr_image(&path, &options)?.render(format)
        })
        .await
    }

    #[tool(description = "Recognize text in a base64-encoded image. Accepts an optional data URL prefix.")]
    async fn ocr_image_base64(
        &self,
        Parameters(params): Parameters<OcrImageBase64Params>,
    ) -> Result<CallToolResult, McpError> {
        let format = self.format_or_default(params.output_format);
        let options = RecognizeOptions {
            language: params.language,
            psm: params.psm,
            oem: params.oem,
            enhance_quality: params.enhance_quality,
        };
        let payload = params.image_base64;

        run_blocking(&self.recognizer, move |recognizer| {
            recognizer.ocr_image_base64(&payload, &options)?.render(format)
        })
        .await
    }

    #[tool(
        description = "Recognize text with preprocessing hints (enhance_contrast, remove_noise, deskew, scale). Runs one enhanced pass."
    )]
    async fn ocr_with_preprocessing(
        &self,
        Parameters(params): Parameters<OcrWithPreprocessingParams>,
    ) -> Result<CallToolResult, McpError> {
        let format = self.format_or_default(params.output_format);
        let options = RecognizeOptions {
            language: params.language,
            psm: params.psm,
            oem: params.oem,
            enhance_quality: Some(true),
        };
        let path = params.image_path;
        let preprocessing = params.preprocessing;

        run_blocking(&self.recognizer, move |recognizer| {
            recognizer
                .ocr_with_preprocessing(&path, &options, &preprocessing)?
                .render(format)
        })
        .await
    }

    #[tool(description = "Recognize text in several image files. Failed images are reported without stopping the batch.")]
    async fn ocr_batch(&self, Parameters(params): Parameters<OcrBatchParams>) -> Result<CallToolResult, McpError> {
        let format = self.format_or_default(params.output_format);
        let options = RecognizeOptions {
            language: params.language,
            psm: params.psm,
            oem: params.oem,
            enhance_quality: params.enhance_quality,
        };
        let paths = params.image_paths.into_iter().map(PathBuf::from).collect();

        let report = self
            .recognizer
            .ocr_batch_concurrent(paths, &options)
            .await
            .map_err(map_adaptive_error_to_mcp)?;
        let response = report.render(format).map_err(map_adaptive_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(response)]))
    }

    #[tool(description = "Recognize text inside a rectangular region of an image. Uses single-block segmentation.")]
    async fn ocr_region(&self, Parameters(params): Parameters<OcrRegionParams>) -> Result<CallToolResult, McpError> {
        let format = self.format_or_default(params.output_format);
        let OcrRegionParams {
            image_path,
            region,
            language,
            enhance_quality,
            ..
        } = params;

        run_blocking(&self.recognizer, move |recognizer| {
            recognizer
                .ocr_region(&image_path, region, language.as_deref(), enhance_quality)?
                .render(format)
        })
        .await
    }

    #[tool(description = "List the supported OCR language codes with usage tips.")]
    fn get_supported_languages(&self, Parameters(_): Parameters<()>) -> Result<CallToolResult, McpError> {
        let response = render_languages(OutputFormat::Text).map_err(map_adaptive_error_to_mcp)?;
        Ok(CallToolResult::success(vec![Content::text(response)]))
    }
}

#[tool_handler]
impl ServerHandler for AdaptiveOcrMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "adaptive-ocr-mcp".to_string(),
                title: Some("Adaptive OCR MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Recognize text in images. Use enhance_quality=true for difficult scans: weak results are \
                 retried with alternative strategies and merged. Use ocr_region for a part of an image and \
                 ocr_batch for several files."
                    .to_string(),
            ),
        }
    }
}

impl Default for AdaptiveOcrMcp {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!("Failed to discover config, using default: {}", e);
            Self::with_config(AdaptiveOcrConfig::default())
        })
    }
}

/// Start the Adaptive OCR MCP server over stdio.
///
/// Blocks until the client disconnects.
pub async fn start_mcp_server() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = AdaptiveOcrMcp::new()?.serve(stdio()).await?;

    service.waiting().await?;
    Ok(())
}

/// Start the MCP server with an explicit configuration.
pub async fn start_mcp_server_with_config(
    config: AdaptiveOcrConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = AdaptiveOcrMcp::with_config(config).serve(stdio()).await?;

    service.waiting().await?;
    Ok(())
}
