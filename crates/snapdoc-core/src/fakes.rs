//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `ScriptedAnalyzer`, `SolidCapture`, and `MemoryWriter`
//! that satisfy the trait contracts without any network, screen, or
//! disk access.

use crate::analysis::AnalysisResult;
use crate::plan::Plan;
use crate::traits::{
    DocumentFormat, DocumentWriter, PasteOutput, PasteRequest, ScreenCapture, VisionAnalyzer,
};
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// SolidCapture
// ---------------------------------------------------------------------------

/// Capture backend that returns a solid-color frame of fixed size.
pub struct SolidCapture {
    width: u32,
    height: u32,
    color: [u8; 4],
    fail: bool,
}

impl SolidCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: [120, 160, 200, 255],
            fail: false,
        }
    }

    /// Make every capture attempt fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0, 0)
        }
    }
}

impl ScreenCapture for SolidCapture {
    fn take_screenshot(&self, _monitor: usize) -> anyhow::Result<DynamicImage> {
        if self.fail {
            anyhow::bail!("no display available");
        }
        let mut img = RgbaImage::new(self.width, self.height);
        for px in img.pixels_mut() {
            *px = Rgba(self.color);
        }
        Ok(DynamicImage::ImageRgba8(img))
    }
}

// ---------------------------------------------------------------------------
// ScriptedAnalyzer
// ---------------------------------------------------------------------------

/// Analyzer that replays a scripted plan and locate result.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    pub plan: Plan,
    pub locate_result: AnalysisResult,
}

impl ScriptedAnalyzer {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            locate_result: AnalysisResult::default(),
        }
    }

    pub fn with_locate_result(mut self, result: AnalysisResult) -> Self {
        self.locate_result = result;
        self
    }
}

#[async_trait]
impl VisionAnalyzer for ScriptedAnalyzer {
    async fn plan_from_text(&self, _instruction: &str) -> Plan {
        self.plan.clone()
    }

    async fn locate(
        &self,
        _image: &[u8],
        _target: &str,
        _image_width: u32,
        _image_height: u32,
    ) -> AnalysisResult {
        self.locate_result.clone()
    }

    async fn describe(&self, _image: &[u8], _question: &str) -> AnalysisResult {
        AnalysisResult {
            description: "scripted description".to_string(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryWriter
// ---------------------------------------------------------------------------

/// A recorded paste call, for assertions.
#[derive(Debug, Clone)]
pub struct RecordedPaste {
    pub image: Vec<u8>,
    pub target: std::path::PathBuf,
    pub position: Option<crate::plan::Position>,
}

/// Document writer that records calls in memory instead of touching
/// disk. Optionally fails every paste with a fixed message.
#[derive(Default)]
pub struct MemoryWriter {
    pub pastes: Mutex<Vec<RecordedPaste>>,
    fail_with: Option<String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every paste fail with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            pastes: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    pub fn paste_count(&self) -> usize {
        self.pastes.lock().unwrap().len()
    }

    /// The image bytes of the most recent paste, if any.
    pub fn last_image(&self) -> Option<Vec<u8>> {
        self.pastes.lock().unwrap().last().map(|p| p.image.clone())
    }
}

impl DocumentWriter for MemoryWriter {
    fn paste(&self, request: &PasteRequest) -> anyhow::Result<PasteOutput> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }
        let image = match &request.image {
            crate::traits::ImageSource::Bytes(bytes) => bytes.clone(),
            crate::traits::ImageSource::Path(path) => std::fs::read(path)?,
        };
        let output_len = image.len();
        self.pastes.lock().unwrap().push(RecordedPaste {
            image,
            target: request.target.clone(),
            position: request.position.clone(),
        });
        let format = request
            .format
            .map_or_else(|| DocumentFormat::from_path(&request.target), Ok)
            .unwrap_or(DocumentFormat::Markdown);
        Ok(PasteOutput {
            output: vec![0u8; output_len],
            format,
        })
    }

    fn supported_formats(&self) -> Vec<DocumentFormat> {
        vec![
            DocumentFormat::Docx,
            DocumentFormat::Pptx,
            DocumentFormat::Markdown,
        ]
    }
}
