//! The assistant orchestrator: one instruction in, one document out.
//!
//! Sequences intent parsing, image acquisition, region location,
//! cropping and document insertion into a single linear pipeline with
//! per-stage audit records. Collaborator failures that are normal
//! operating conditions of a best-effort AI pipeline (unparseable
//! model output, no visual match) are absorbed into the step log;
//! only resource-level failures fail the run, and even those are
//! returned as data, never as an `Err`.

use crate::analysis::{CandidateRegion, LocateOutcome};
use crate::plan::SizeHint;
use crate::raster;
use crate::region::Region;
use crate::step::{step_names, StepLog, StepStatus};
use crate::traits::{
    DocumentWriter, ImageSource, PasteRequest, ScreenCapture, VisionAnalyzer,
};
use image::DynamicImage;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Callback invoked for every step as it is appended (UI integration).
pub type StepCallback = Box<dyn Fn(&StepLog) + Send + Sync>;

/// Why the acquire stage produced no image.
enum AcquireError {
    /// No bytes, no path, and the plan does not call for a screenshot.
    NoSource,

    /// A source existed but could not be read, decoded or captured.
    Failed(String),
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSource => f.write_str("no image source and screenshot not needed"),
            Self::Failed(detail) => f.write_str(detail),
        }
    }
}

/// Inputs for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Natural-language instruction, e.g.
    /// "put the revenue chart on screen into report.docx".
    pub instruction: String,

    /// Use this image file instead of taking a screenshot.
    pub image_path: Option<PathBuf>,

    /// Use these image bytes instead of taking a screenshot.
    /// Takes priority over `image_path`.
    pub image_bytes: Option<Vec<u8>>,

    /// Skip analyzer location and crop to exactly this region.
    pub region: Option<Region>,

    /// Override the output path (otherwise taken from the plan).
    pub output_path: Option<PathBuf>,

    /// Monitor to capture (0 = all monitors combined).
    pub monitor: usize,
}

impl RunRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            ..Self::default()
        }
    }

    pub fn with_image_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.image_bytes = Some(bytes);
        self
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Terminal output of one pipeline run.
///
/// Created exactly once per [`Assistant::run`] invocation; the step
/// sequence is the full audit trail and includes every stage attempted
/// before a failure point.
#[derive(Debug, Clone)]
pub struct AssistantResult {
    /// Whether all mandatory stages completed.
    pub success: bool,

    /// Target document path, when one was resolved.
    pub output_path: Option<PathBuf>,

    /// One-line human-readable outcome.
    pub summary: String,

    /// Ordered per-stage audit records.
    pub steps: Vec<StepLog>,

    /// The image that was (or would have been) inserted.
    pub cropped_image: Option<Vec<u8>>,

    /// Run metadata (total duration, the plan, ...).
    pub metadata: serde_json::Value,
}

impl AssistantResult {
    fn failure(
        output_path: Option<PathBuf>,
        summary: impl Into<String>,
        steps: Vec<StepLog>,
        cropped_image: Option<Vec<u8>>,
    ) -> Self {
        Self {
            success: false,
            output_path,
            summary: summary.into(),
            steps,
            cropped_image,
            metadata: json!({}),
        }
    }

    /// Step record for a given stage name, if one was produced.
    pub fn step(&self, name: &str) -> Option<&StepLog> {
        self.steps.iter().find(|s| s.step == name)
    }
}

/// The pipeline orchestrator.
///
/// Constructed with already-built collaborator handles; there is no
/// lazy global state, so tests substitute fakes directly. The analyzer
/// is optional: [`Assistant::quick_capture`] is the no-AI path and
/// never touches it.
pub struct Assistant {
    capture: Arc<dyn ScreenCapture>,
    writer: Arc<dyn DocumentWriter>,
    analyzer: Option<Arc<dyn VisionAnalyzer>>,
    on_step: Option<StepCallback>,
}

impl Assistant {
    pub fn new(capture: Arc<dyn ScreenCapture>, writer: Arc<dyn DocumentWriter>) -> Self {
        Self {
            capture,
            writer,
            analyzer: None,
            on_step: None,
        }
    }

    /// Attach the analyzer collaborator (required for [`Assistant::run`]).
    pub fn with_analyzer(mut self, analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Attach a per-step callback.
    pub fn with_step_callback(mut self, on_step: StepCallback) -> Self {
        self.on_step = Some(on_step);
        self
    }

    fn push_step(&self, steps: &mut Vec<StepLog>, log: StepLog) {
        match log.status {
            StepStatus::Error => {
                warn!(step = %log.step, detail = %log.detail, "pipeline step failed")
            }
            _ => info!(
                step = %log.step,
                status = ?log.status,
                detail = %log.detail,
                duration_ms = log.duration_ms,
                "pipeline step"
            ),
        }
        if let Some(callback) = &self.on_step {
            callback(&log);
        }
        steps.push(log);
    }

    /// Execute the full pipeline from a single instruction.
    ///
    /// Stage order is fixed: `parse_intent`, `acquire_image`,
    /// `locate_region`, `crop`, `insert_into_document`. Every stage
    /// attempted appends exactly one step record; there is no retry
    /// and no branching back. The returned result is never an error —
    /// pipeline-level failures surface as `success == false` with the
    /// partial step trail.
    pub async fn run(&self, request: RunRequest) -> AssistantResult {
        let mut steps: Vec<StepLog> = Vec::new();
        let run_start = Instant::now();

        let Some(analyzer) = self.analyzer.clone() else {
            self.push_step(
                &mut steps,
                StepLog::error(step_names::PARSE_INTENT, "no analyzer configured"),
            );
            return AssistantResult::failure(
                None,
                "No analyzer configured; quick_capture is the no-AI path.",
                steps,
                None,
            );
        };

        // -- Stage 1: parse intent --
        let stage_start = Instant::now();
        let plan = analyzer.plan_from_text(&request.instruction).await;
        let plan_json = serde_json::to_value(&plan).unwrap_or(serde_json::Value::Null);
        self.push_step(
            &mut steps,
            StepLog::ok(step_names::PARSE_INTENT, plan.reasoning.clone())
                .with_duration_ms(stage_start.elapsed().as_millis() as u64)
                .with_data(plan_json.clone()),
        );

        let target_doc = request
            .output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&plan.target_document));

        // -- Stage 2: acquire image --
        let stage_start = Instant::now();
        let acquired = self.acquire_image(&request, plan.needs_screenshot);
        let (full_image, screenshot_bytes, source_detail, source) = match acquired {
            Ok(acquired) => acquired,
            Err(error) => {
                let detail = error.to_string();
                self.push_step(
                    &mut steps,
                    StepLog::error(step_names::ACQUIRE_IMAGE, &detail)
                        .with_duration_ms(stage_start.elapsed().as_millis() as u64),
                );
                let summary = match error {
                    AcquireError::NoSource => {
                        "No image source and screenshot not needed.".to_string()
                    }
                    AcquireError::Failed(detail) => detail,
                };
                return AssistantResult::failure(Some(target_doc), summary, steps, None);
            }
        };
        self.push_step(
            &mut steps,
            StepLog::ok(step_names::ACQUIRE_IMAGE, &source_detail)
                .with_duration_ms(stage_start.elapsed().as_millis() as u64)
                .with_data(json!({
                    "source": source,
                    "width": full_image.width(),
                    "height": full_image.height(),
                })),
        );

        // -- Stage 3: locate region --
        let outcome = if let Some(region) = request.region {
            self.push_step(
                &mut steps,
                StepLog::skipped(step_names::LOCATE_REGION, "manual region"),
            );
            LocateOutcome::Located(CandidateRegion {
                label: "manual".to_string(),
                region,
                confidence: 1.0,
            })
        } else if let Some(target) = plan
            .target_element
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            let stage_start = Instant::now();
            let located = analyzer
                .locate(
                    &screenshot_bytes,
                    target,
                    full_image.width(),
                    full_image.height(),
                )
                .await;
            let duration_ms = stage_start.elapsed().as_millis() as u64;
            match located.best_region().cloned() {
                Some(best) => {
                    self.push_step(
                        &mut steps,
                        StepLog::ok(
                            step_names::LOCATE_REGION,
                            format!("found '{}' at {}", best.label, best.region),
                        )
                        .with_duration_ms(duration_ms)
                        .with_data(json!({
                            "regions": located.regions,
                            "confidence": best.confidence,
                        })),
                    );
                    LocateOutcome::Located(best)
                }
                None => {
                    self.push_step(
                        &mut steps,
                        StepLog::ok(step_names::LOCATE_REGION, "not found, using full image")
                            .with_duration_ms(duration_ms),
                    );
                    LocateOutcome::NotLocated
                }
            }
        } else {
            self.push_step(
                &mut steps,
                StepLog::skipped(step_names::LOCATE_REGION, "no target"),
            );
            LocateOutcome::NotLocated
        };

        // -- Stage 4: crop --
        let mut inserted_bytes = screenshot_bytes.clone();
        match &outcome {
            LocateOutcome::Located(candidate) => {
                let stage_start = Instant::now();
                let clamped = candidate
                    .region
                    .clamp(full_image.width(), full_image.height());
                if clamped.is_empty() {
                    self.push_step(
                        &mut steps,
                        StepLog::ok(
                            step_names::CROP,
                            "region clamped to zero area, using full image",
                        ),
                    );
                } else {
                    let cropped = raster::crop_image(&full_image, clamped);
                    match raster::encode_png(&cropped) {
                        Ok(bytes) => {
                            inserted_bytes = bytes;
                            self.push_step(
                                &mut steps,
                                StepLog::ok(
                                    step_names::CROP,
                                    format!("{}x{}", clamped.width, clamped.height),
                                )
                                .with_duration_ms(stage_start.elapsed().as_millis() as u64)
                                .with_data(json!({ "region": clamped })),
                            );
                        }
                        Err(e) => {
                            // Fall back to the full frame; only the
                            // insert stage may fail the run.
                            self.push_step(
                                &mut steps,
                                StepLog::error(
                                    step_names::CROP,
                                    format!("crop encode failed, using full image: {e}"),
                                ),
                            );
                        }
                    }
                }
            }
            LocateOutcome::NotLocated => {
                self.push_step(&mut steps, StepLog::skipped(step_names::CROP, "no region"));
            }
        }

        // -- Stage 5: insert into document --
        let stage_start = Instant::now();
        let paste = PasteRequest {
            image: ImageSource::Bytes(inserted_bytes.clone()),
            target: target_doc.clone(),
            format: None,
            position: plan.position.clone(),
            size: plan.size,
            embed: true,
            alt_text: plan
                .target_element
                .clone()
                .unwrap_or_else(|| "image".to_string()),
        };
        match self.writer.paste(&paste) {
            Ok(output) => {
                self.push_step(
                    &mut steps,
                    StepLog::ok(
                        step_names::INSERT_INTO_DOCUMENT,
                        format!("{} bytes -> {}", output.output.len(), target_doc.display()),
                    )
                    .with_duration_ms(stage_start.elapsed().as_millis() as u64)
                    .with_data(json!({ "format": output.format })),
                );
            }
            Err(e) => {
                self.push_step(
                    &mut steps,
                    StepLog::error(step_names::INSERT_INTO_DOCUMENT, e.to_string())
                        .with_duration_ms(stage_start.elapsed().as_millis() as u64),
                );
                return AssistantResult::failure(
                    Some(target_doc),
                    format!("Failed to paste: {e}"),
                    steps,
                    Some(inserted_bytes),
                );
            }
        }

        let total_ms = run_start.elapsed().as_millis() as u64;
        let summary = format!(
            "Captured '{}' -> pasted into {} ({}ms total)",
            plan.target_element.as_deref().unwrap_or("screen"),
            target_doc.display(),
            total_ms
        );
        info!(%summary, "pipeline complete");

        AssistantResult {
            success: true,
            output_path: Some(target_doc),
            summary,
            steps,
            cropped_image: Some(inserted_bytes),
            metadata: json!({ "total_ms": total_ms, "plan": plan_json }),
        }
    }

    /// Resolve the image source by priority: explicit bytes, then an
    /// explicit path, then a fresh capture when the plan calls for one.
    #[allow(clippy::type_complexity)]
    fn acquire_image(
        &self,
        request: &RunRequest,
        needs_screenshot: bool,
    ) -> Result<(DynamicImage, Vec<u8>, String, &'static str), AcquireError> {
        if let Some(bytes) = &request.image_bytes {
            let image = raster::decode_image(bytes)
                .map_err(|e| AcquireError::Failed(format!("unreadable image bytes: {e}")))?;
            return Ok((image, bytes.clone(), "from bytes".to_string(), "bytes"));
        }
        if let Some(path) = &request.image_path {
            let bytes = std::fs::read(path).map_err(|e| {
                AcquireError::Failed(format!("cannot read image {}: {e}", path.display()))
            })?;
            let image = raster::decode_image(&bytes).map_err(|e| {
                AcquireError::Failed(format!("unreadable image {}: {e}", path.display()))
            })?;
            return Ok((image, bytes, format!("from {}", path.display()), "path"));
        }
        if needs_screenshot {
            let image = self
                .capture
                .take_screenshot(request.monitor)
                .map_err(|e| AcquireError::Failed(format!("screen capture failed: {e}")))?;
            let bytes = raster::encode_png(&image)
                .map_err(|e| AcquireError::Failed(format!("screenshot encode failed: {e}")))?;
            let detail = format!("{}x{}", image.width(), image.height());
            return Ok((image, bytes, detail, "screenshot"));
        }
        Err(AcquireError::NoSource)
    }

    /// Shortcut: capture the full screen and paste it unconditionally.
    ///
    /// A strict two-stage reduction of the pipeline with its own step
    /// pair (`screenshot`, `paste`); no analyzer is involved.
    pub async fn quick_capture(
        &self,
        output_path: impl Into<PathBuf>,
        monitor: usize,
        size: Option<SizeHint>,
    ) -> AssistantResult {
        let output_path = output_path.into();
        let mut steps: Vec<StepLog> = Vec::new();
        let run_start = Instant::now();

        let stage_start = Instant::now();
        let (image, bytes) = match self
            .capture
            .take_screenshot(monitor)
            .map_err(|e| format!("screen capture failed: {e}"))
            .and_then(|image| {
                raster::encode_png(&image)
                    .map(|bytes| (image, bytes))
                    .map_err(|e| format!("screenshot encode failed: {e}"))
            }) {
            Ok(captured) => captured,
            Err(detail) => {
                self.push_step(&mut steps, StepLog::error(step_names::SCREENSHOT, &detail));
                return AssistantResult::failure(Some(output_path), detail, steps, None);
            }
        };
        self.push_step(
            &mut steps,
            StepLog::ok(
                step_names::SCREENSHOT,
                format!("{}x{}", image.width(), image.height()),
            )
            .with_duration_ms(stage_start.elapsed().as_millis() as u64),
        );

        let stage_start = Instant::now();
        let mut paste = PasteRequest::new(ImageSource::Bytes(bytes.clone()), output_path.clone());
        paste.size = size;
        match self.writer.paste(&paste) {
            Ok(_) => {
                self.push_step(
                    &mut steps,
                    StepLog::ok(
                        step_names::PASTE,
                        format!("-> {}", output_path.display()),
                    )
                    .with_duration_ms(stage_start.elapsed().as_millis() as u64),
                );
            }
            Err(e) => {
                self.push_step(
                    &mut steps,
                    StepLog::error(step_names::PASTE, e.to_string()),
                );
                return AssistantResult::failure(
                    Some(output_path),
                    format!("Failed to paste: {e}"),
                    steps,
                    Some(bytes),
                );
            }
        }

        let total_ms = run_start.elapsed().as_millis() as u64;
        AssistantResult {
            success: true,
            output_path: Some(output_path.clone()),
            summary: format!(
                "Full screenshot -> {} ({}ms)",
                output_path.display(),
                total_ms
            ),
            steps,
            cropped_image: Some(bytes),
            metadata: json!({ "total_ms": total_ms }),
        }
    }

    /// Capture and locate only: return the cropped image bytes (or the
    /// full frame) plus the winning region, without touching any
    /// document. For callers that handle pasting themselves.
    pub async fn capture_region(
        &self,
        instruction: &str,
        monitor: usize,
    ) -> anyhow::Result<(Vec<u8>, Option<Region>)> {
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no analyzer configured"))?;

        let image = self.capture.take_screenshot(monitor)?;
        let bytes = raster::encode_png(&image)?;

        let plan = analyzer.plan_from_text(instruction).await;
        let Some(target) = plan.target_element.filter(|t| !t.trim().is_empty()) else {
            return Ok((bytes, None));
        };

        let located = analyzer
            .locate(&bytes, &target, image.width(), image.height())
            .await;
        match located.best_region() {
            Some(best) => {
                let clamped = best.region.clamp(image.width(), image.height());
                if clamped.is_empty() {
                    return Ok((bytes, None));
                }
                let cropped = raster::crop_image(&image, clamped);
                Ok((raster::encode_png(&cropped)?, Some(clamped)))
            }
            None => Ok((bytes, None)),
        }
    }
}
