//! Model Context Protocol (MCP) server implementation.
//!
//! Exposes the adaptive recognition operations as MCP tools:
//!
//! - **ocr_image**: recognize an image file
//! - **ocr_image_base64**: recognize a base64-encoded image
//! - **ocr_with_preprocessing**: single enhanced pass driven by preprocessing hints
//! - **ocr_batch**: recognize several files with per-item error capture
//! - **ocr_region**: recognize a rectangular region
//! - **get_supported_languages**: list language codes
//!
//! # Example
//!
//! ```rust,no_run
//! use adaptive_ocr::mcp::start_mcp_server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     start_mcp_server().await?;
//!     Ok(())
//! }
//! ```

mod server;

pub use server::{start_mcp_server, start_mcp_server_with_config};

pub use server::{
    AdaptiveOcrMcp, OcrBatchParams, OcrImageBase64Params, OcrImageParams, OcrRegionParams, OcrWithPreprocessingParams,
};

#[doc(hidden)]
pub use server::map_adaptive_error_to_mcp;
