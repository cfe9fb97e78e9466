//! Adaptive OCR command-line interface.
//!
//! # Usage
//!
//! ```bash
//! adaptive-ocr serve --config adaptive-ocr.toml
//! adaptive-ocr recognize scan.png --language eng+fra --enhance
//! adaptive-ocr recognize form.png --region 40,120,600,80 --format json
//! adaptive-ocr batch page1.png page2.png --enhance
//! adaptive-ocr languages
//! ```
//!
//! Logs go to stderr; stdout carries results or the MCP stdio transport.

use std::path::{Path, PathBuf};

use adaptive_ocr::core::format::render_languages;
use adaptive_ocr::{AdaptiveOcrConfig, OutputFormat, RecognizeOptions, Recognizer, Region};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adaptive-ocr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adaptive multi-pass OCR via CLI or MCP server", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to a discovered adaptive-ocr.toml
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over stdio
    Serve,

    /// Recognize text in one image
    Recognize {
        /// Image file to recognize
        image: PathBuf,

        #[command(flatten)]
        recognition: RecognitionArgs,

        /// Restrict recognition to a region, given as x,y,width,height (uses PSM 6 and OEM 3)
        #[arg(long, value_parser = parse_region, conflicts_with_all = ["psm", "oem"])]
        region: Option<Region>,
    },

    /// Recognize text in several images
    Batch {
        /// Image files to recognize
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        recognition: RecognitionArgs,
    },

    /// List supported language codes
    Languages {
        /// Output format (text, json)
        #[arg(long, short)]
        format: Option<OutputFormat>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct RecognitionArgs {
    /// Language code(s), e.g. eng or eng+chi_sim
    #[arg(long, short)]
    language: Option<String>,

    /// Page segmentation mode (0-13)
    #[arg(long)]
    psm: Option<u8>,

    /// OCR engine mode (0-3)
    #[arg(long)]
    oem: Option<u8>,

    /// Retry weak results with other strategies and merge them
    #[arg(long, short)]
    enhance: bool,

    /// Output format (text, json)
    #[arg(long, short)]
    format: Option<OutputFormat>,
}

impl RecognitionArgs {
    fn options(&self) -> RecognizeOptions {
        RecognizeOptions {
            language: self.language.clone(),
            psm: self.psm,
            oem: self.oem,
            enhance_quality: self.enhance.then_some(true),
        }
    }
}

fn parse_region(value: &str) -> std::result::Result<Region, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("Invalid region '{}': expected x,y,width,height", value));
    }

    let mut numbers = [0u32; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("Invalid region '{}': '{}' is not a non-negative integer", value, part))?;
    }

    Ok(Region {
        x: numbers[0],
        y: numbers[1],
        width: numbers[2],
        height: numbers[3],
    })
}

fn load_config(path: Option<&Path>) -> Result<AdaptiveOcrConfig> {
    match path {
        Some(path) => AdaptiveOcrConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(AdaptiveOcrConfig::discover()
            .context("Failed to discover configuration")?
            .unwrap_or_default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let default_format = config.output_format;

    match cli.command {
        Commands::Serve => {
            tracing::info!(language = %config.language, "starting MCP server on stdio");
            adaptive_ocr::mcp::start_mcp_server_with_config(config)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        Commands::Recognize {
            image,
            recognition,
            region,
        } => {
            let format = recognition.format.unwrap_or(default_format);
            let options = recognition.options();
            let recognizer = Recognizer::native(config);

            let output = tokio::task::spawn_blocking(move || -> adaptive_ocr::Result<String> {
                let report = match region {
                    Some(region) => {
                        recognizer.ocr_region(&image, region, options.language.as_deref(), options.enhance_quality)?
                    }
                    None => recognizer.ocr_image(&image, &options)?,
                };
                report.render(format)
            })
            .await
            .context("Recognition task failed")??;

            println!("{}", output);
        }
        Commands::Batch { images, recognition } => {
            let format = recognition.format.unwrap_or(default_format);
            let recognizer = Recognizer::native(config);

            let report = recognizer.ocr_batch_concurrent(images, &recognition.options()).await?;
            println!("{}", report.render(format)?);

            if report.failed > 0 {
                tracing::warn!(failed = report.failed, total = report.total, "some images failed");
            }
        }
        Commands::Languages { format } => {
            println!("{}", render_languages(format.unwrap_or(default_format))?);
        }
    }

    Ok(())
}
