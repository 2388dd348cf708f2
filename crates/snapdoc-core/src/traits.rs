//! Collaborator contracts the orchestrator depends on.
//!
//! Concrete backends live in their own crates (`snapdoc-capture`,
//! `snapdoc-vision`, `snapdoc-writer`); the orchestrator is handed
//! already-built trait objects so tests can substitute the fakes in
//! [`crate::fakes`] deterministically.

use crate::analysis::AnalysisResult;
use crate::error::CoreError;
use crate::plan::{Plan, Position, SizeHint};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Screen-capture collaborator.
///
/// Monitor index 0 denotes "all monitors combined"; index N >= 1 is
/// the Nth monitor.
pub trait ScreenCapture: Send + Sync {
    fn take_screenshot(&self, monitor: usize) -> anyhow::Result<DynamicImage>;
}

/// Remote multimodal analyzer collaborator.
///
/// All three calls are infallible at this boundary: transport and
/// parse failures are absorbed into degraded [`Plan`] /
/// [`AnalysisResult`] values carrying diagnostics. Construction of a
/// concrete analyzer is where configuration errors surface.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Parse intent from the instruction text alone.
    async fn plan_from_text(&self, instruction: &str) -> Plan;

    /// Find `target` within the image, returning candidate regions in
    /// absolute pixel coordinates for the stated dimensions.
    async fn locate(
        &self,
        image: &[u8],
        target: &str,
        image_width: u32,
        image_height: u32,
    ) -> AnalysisResult;

    /// Free-form description of the image. Diagnostics and demo flows
    /// only; not on the critical path.
    async fn describe(&self, image: &[u8], question: &str) -> AnalysisResult;
}

/// Supported target container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Docx,
    Pptx,
    Markdown,
}

impl DocumentFormat {
    /// Resolve a format from a target path's extension.
    ///
    /// Unknown extensions are a typed error, never a silent fallback.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(CoreError::UnsupportedFormat { extension }),
        }
    }

    /// Canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Markdown => "md",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where the image to insert comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// One insertion request handed to the document writer.
#[derive(Debug, Clone)]
pub struct PasteRequest {
    /// Image to insert.
    pub image: ImageSource,

    /// Target container file.
    pub target: PathBuf,

    /// Explicit format override; resolved from the target's extension
    /// when absent.
    pub format: Option<DocumentFormat>,

    /// Logical insertion position (format-specific).
    pub position: Option<Position>,

    /// Physical size hint in inches.
    pub size: Option<SizeHint>,

    /// Inline the image (e.g. base64 in markdown) rather than
    /// referencing it by external path.
    pub embed: bool,

    /// Alt text for formats that carry one.
    pub alt_text: String,
}

impl PasteRequest {
    /// Request with the common defaults: embed, alt text "image",
    /// position and size unset.
    pub fn new(image: ImageSource, target: impl Into<PathBuf>) -> Self {
        Self {
            image,
            target: target.into(),
            format: None,
            position: None,
            size: None,
            embed: true,
            alt_text: "image".to_string(),
        }
    }
}

/// Result of a completed insertion.
#[derive(Debug, Clone)]
pub struct PasteOutput {
    /// Full bytes of the written target document.
    pub output: Vec<u8>,

    /// The format that was resolved and written.
    pub format: DocumentFormat,
}

/// Document-writer collaborator.
pub trait DocumentWriter: Send + Sync {
    fn paste(&self, request: &PasteRequest) -> anyhow::Result<PasteOutput>;

    fn supported_formats(&self) -> Vec<DocumentFormat>;
}
