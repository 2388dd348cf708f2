//! snapdoc - instruction-driven screenshot-to-document assistant
//!
//! ## Commands
//!
//! - `assist`: Run the full pipeline from a natural-language instruction
//! - `quick`: Capture the full screen and paste it, no AI involved
//! - `paste`: Insert an existing image file into a document directly
//! - `formats`: List the supported target document formats

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use snapdoc_capture::XcapCapture;
use snapdoc_core::{
    Assistant, DocumentFormat, DocumentWriter, ImageSource, PasteRequest, Position, RunRequest,
    SizeHint,
};
use snapdoc_vision::{AnalyzerConfig, GatewayAnalyzer};
use snapdoc_writer::SnapdocWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;

mod telemetry;

#[derive(Parser)]
#[command(name = "snapdoc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capture the screen, find a region, paste it into a document", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline from a natural-language instruction
    Assist {
        /// What to capture and where to put it,
        /// e.g. "put the revenue chart into report.docx"
        instruction: String,

        /// Use this image file instead of taking a screenshot
        #[arg(long)]
        image: Option<PathBuf>,

        /// Override the output document path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Monitor to capture (0 = all monitors combined)
        #[arg(long, default_value_t = 0)]
        monitor: usize,

        /// Model identifier for the analyzer gateway
        #[arg(long)]
        model: Option<String>,
    },

    /// Capture the full screen and paste it into a document
    Quick {
        /// Output document path
        #[arg(short, long, default_value = "output.docx")]
        output: PathBuf,

        /// Monitor to capture (0 = all monitors combined)
        #[arg(long, default_value_t = 0)]
        monitor: usize,

        /// Display width of the pasted image, in inches
        #[arg(long)]
        width: Option<f64>,
    },

    /// Insert an existing image file into a document
    Paste {
        /// Image file to insert
        image: PathBuf,

        /// Target document
        #[arg(long = "to")]
        target: PathBuf,

        /// Format override when the target extension is ambiguous
        #[arg(long)]
        format: Option<String>,

        /// Display width in inches
        #[arg(long)]
        width: Option<f64>,

        /// Display height in inches
        #[arg(long)]
        height: Option<f64>,

        /// Slide number to paste into (pptx, 1-indexed)
        #[arg(long, conflicts_with = "paragraph")]
        slide: Option<usize>,

        /// Paragraph index to paste after (docx, 0-indexed)
        #[arg(long)]
        paragraph: Option<usize>,

        /// Reference the image by path instead of embedding it (markdown)
        #[arg(long)]
        no_embed: bool,

        /// Alt text for the inserted image
        #[arg(long, default_value = "image")]
        alt: String,
    },

    /// List the supported target document formats
    Formats,
}

fn parse_format(name: &str) -> Result<DocumentFormat> {
    match name.to_ascii_lowercase().as_str() {
        "docx" => Ok(DocumentFormat::Docx),
        "pptx" => Ok(DocumentFormat::Pptx),
        "md" | "markdown" => Ok(DocumentFormat::Markdown),
        other => bail!("unsupported format '{other}' (expected docx, pptx or md)"),
    }
}

async fn cmd_assist(
    instruction: String,
    image: Option<PathBuf>,
    output: Option<PathBuf>,
    monitor: usize,
    model: Option<String>,
) -> Result<bool> {
    let capture = XcapCapture::probe().context("no capturable display")?;
    let mut config = AnalyzerConfig::from_env().context("analyzer configuration")?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    let analyzer = GatewayAnalyzer::new(config).context("analyzer construction")?;

    let assistant = Assistant::new(Arc::new(capture), Arc::new(SnapdocWriter::new()))
        .with_analyzer(Arc::new(analyzer));

    let mut request = RunRequest::new(instruction);
    request.image_path = image;
    request.output_path = output;
    request.monitor = monitor;

    let result = assistant.run(request).await;
    if result.success {
        println!("Done: {}", result.summary);
    } else {
        eprintln!("Failed: {}", result.summary);
    }
    Ok(result.success)
}

async fn cmd_quick(output: PathBuf, monitor: usize, width: Option<f64>) -> Result<bool> {
    let capture = XcapCapture::probe().context("no capturable display")?;
    let assistant = Assistant::new(Arc::new(capture), Arc::new(SnapdocWriter::new()));

    let result = assistant
        .quick_capture(output, monitor, width.map(SizeHint::width))
        .await;
    if result.success {
        println!("Done: {}", result.summary);
    } else {
        eprintln!("Failed: {}", result.summary);
    }
    Ok(result.success)
}

#[allow(clippy::too_many_arguments)]
fn cmd_paste(
    image: PathBuf,
    target: PathBuf,
    format: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    slide: Option<usize>,
    paragraph: Option<usize>,
    no_embed: bool,
    alt: String,
) -> Result<bool> {
    let position = slide
        .map(Position::Slide)
        .or(paragraph.map(Position::Paragraph));
    let size = if width.is_some() || height.is_some() {
        Some(SizeHint { width, height })
    } else {
        None
    };

    let request = PasteRequest {
        image: ImageSource::Path(image),
        target: target.clone(),
        format: format.as_deref().map(parse_format).transpose()?,
        position,
        size,
        embed: !no_embed,
        alt_text: alt,
    };
    let output = SnapdocWriter::new()
        .paste(&request)
        .with_context(|| format!("pasting into {}", target.display()))?;
    println!("Done: pasted into {} ({})", target.display(), output.format);
    Ok(true)
}

fn cmd_formats() -> Result<bool> {
    for format in SnapdocWriter::new().supported_formats() {
        println!("{format}");
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Assist {
            instruction,
            image,
            output,
            monitor,
            model,
        } => cmd_assist(instruction, image, output, monitor, model).await,
        Commands::Quick {
            output,
            monitor,
            width,
        } => cmd_quick(output, monitor, width).await,
        Commands::Paste {
            image,
            target,
            format,
            width,
            height,
            slide,
            paragraph,
            no_embed,
            alt,
        } => cmd_paste(
            image, target, format, width, height, slide, paragraph, no_embed, alt,
        ),
        Commands::Formats => cmd_formats(),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
