//! Integration tests for the assistant pipeline with in-memory fakes.

use snapdoc_core::fakes::{MemoryWriter, ScriptedAnalyzer, SolidCapture};
use snapdoc_core::{
    raster, step_names, AnalysisResult, Assistant, CandidateRegion, Plan, Region, RunRequest,
    StepStatus,
};
use std::sync::Arc;

fn plan_with_target(target: Option<&str>) -> Plan {
    Plan {
        target_element: target.map(String::from),
        target_document: "report.docx".to_string(),
        reasoning: "user wants a capture pasted".to_string(),
        ..Plan::default()
    }
}

fn candidate(label: &str, region: Region, confidence: f64) -> CandidateRegion {
    CandidateRegion {
        label: label.to_string(),
        region,
        confidence,
    }
}

fn assistant(
    analyzer: ScriptedAnalyzer,
    capture: SolidCapture,
    writer: Arc<MemoryWriter>,
) -> Assistant {
    Assistant::new(Arc::new(capture), writer).with_analyzer(Arc::new(analyzer))
}

fn step_names_of(result: &snapdoc_core::AssistantResult) -> Vec<&str> {
    result.steps.iter().map(|s| s.step.as_str()).collect()
}

/// Test: full successful run logs every stage in the fixed order.
#[tokio::test]
async fn test_full_run_logs_stages_in_order() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(Some("revenue chart"))).with_locate_result(
        AnalysisResult {
            regions: vec![candidate("revenue chart", Region::new(100, 100, 400, 300), 0.9)],
            ..Default::default()
        },
    );
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(1280, 720), writer.clone());

    let result = assistant
        .run(RunRequest::new("put the revenue chart into report.docx"))
        .await;

    assert!(result.success, "run failed: {}", result.summary);
    assert_eq!(
        step_names_of(&result),
        vec![
            step_names::PARSE_INTENT,
            step_names::ACQUIRE_IMAGE,
            step_names::LOCATE_REGION,
            step_names::CROP,
            step_names::INSERT_INTO_DOCUMENT,
        ]
    );
    assert!(result.steps.iter().all(|s| s.status != StepStatus::Error));
    assert_eq!(writer.paste_count(), 1);
    assert_eq!(result.output_path.as_deref().unwrap().to_str(), Some("report.docx"));
}

/// Test: supplied image bytes take priority - no screenshot source
/// appears anywhere in the step log.
#[tokio::test]
async fn test_image_bytes_priority_skips_capture() {
    let input = raster::encode_png(&image::DynamicImage::new_rgba8(64, 48)).unwrap();
    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::new());
    // A failing capture backend proves the capture path is never taken.
    let assistant = assistant(analyzer, SolidCapture::failing(), writer.clone());

    let result = assistant
        .run(RunRequest::new("paste this into report.docx").with_image_bytes(input))
        .await;

    assert!(result.success, "run failed: {}", result.summary);
    let acquire = result.step(step_names::ACQUIRE_IMAGE).unwrap();
    assert_eq!(acquire.data["source"], "bytes");
    assert!(result
        .steps
        .iter()
        .all(|s| s.step != step_names::SCREENSHOT));
}

/// Test: no target element - locate is skipped, crop is skipped, and
/// the inserted image is the full acquired image.
#[tokio::test]
async fn test_no_target_inserts_full_image() {
    let input = raster::encode_png(&image::DynamicImage::new_rgba8(64, 48)).unwrap();
    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(64, 48), writer.clone());

    let result = assistant
        .run(RunRequest::new("paste into report.docx").with_image_bytes(input.clone()))
        .await;

    assert!(result.success);
    let locate = result.step(step_names::LOCATE_REGION).unwrap();
    assert_eq!(locate.status, StepStatus::Skipped);
    let crop = result.step(step_names::CROP).unwrap();
    assert_eq!(crop.status, StepStatus::Skipped);
    assert_eq!(writer.last_image().unwrap(), input);
}

/// Test: locate returning no candidates is an expected absence - the
/// stage is ok (not error) and the full image is used.
#[tokio::test]
async fn test_locate_miss_is_ok_not_error() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(Some("a chart")))
        .with_locate_result(AnalysisResult::default());
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(320, 200), writer.clone());

    let result = assistant.run(RunRequest::new("grab the chart")).await;

    assert!(result.success);
    let locate = result.step(step_names::LOCATE_REGION).unwrap();
    assert_eq!(locate.status, StepStatus::Ok);
    assert!(locate.detail.contains("not found"));
    let crop = result.step(step_names::CROP).unwrap();
    assert_eq!(crop.status, StepStatus::Skipped);
}

/// Test: best-confidence candidate wins the locate stage.
#[tokio::test]
async fn test_locate_selects_highest_confidence() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(Some("chart"))).with_locate_result(
        AnalysisResult {
            regions: vec![
                candidate("weak", Region::new(0, 0, 50, 50), 0.4),
                candidate("strong", Region::new(100, 100, 50, 50), 0.9),
            ],
            ..Default::default()
        },
    );
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(640, 480), writer);

    let result = assistant.run(RunRequest::new("grab the chart")).await;

    assert!(result.success);
    let locate = result.step(step_names::LOCATE_REGION).unwrap();
    assert!(locate.detail.contains("strong"));
    assert_eq!(locate.data["confidence"], 0.9);
}

/// Test: manual region skips the analyzer locate entirely and crops
/// after clamping.
#[tokio::test]
async fn test_manual_region_skips_locate() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(Some("chart")));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(640, 480), writer.clone());

    let result = assistant
        .run(
            RunRequest::new("grab the chart")
                .with_region(Region::new(-10, 20, 5000, 100)),
        )
        .await;

    assert!(result.success);
    let locate = result.step(step_names::LOCATE_REGION).unwrap();
    assert_eq!(locate.status, StepStatus::Skipped);
    assert_eq!(locate.detail, "manual region");
    let crop = result.step(step_names::CROP).unwrap();
    assert_eq!(crop.status, StepStatus::Ok);
    // Clamped to 640x480: left 0, width 640, height 100.
    assert_eq!(crop.detail, "640x100");
}

/// Test: a manual region matching the full image bounds re-encodes to
/// bytes identical to the input re-encoded in the same format.
#[tokio::test]
async fn test_full_bounds_region_round_trips() {
    let source = {
        let mut img = image::RgbaImage::new(40, 30);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgba([(x * 6) as u8, (y * 8) as u8, 77, 255]);
        }
        image::DynamicImage::ImageRgba8(img)
    };
    let input = raster::encode_png(&source).unwrap();
    let reencoded = raster::encode_png(&raster::decode_image(&input).unwrap()).unwrap();

    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::failing(), writer.clone());

    let result = assistant
        .run(
            RunRequest::new("paste into notes.md")
                .with_image_bytes(input)
                .with_region(Region::new(0, 0, 40, 30)),
        )
        .await;

    assert!(result.success);
    assert_eq!(writer.last_image().unwrap(), reencoded);
}

/// Test: no bytes, no path, and a plan that says no screenshot is
/// needed - the run fails fast with a descriptive summary and no
/// insert stage ever runs.
#[tokio::test]
async fn test_no_image_source_fails_fast() {
    let plan = Plan {
        needs_screenshot: false,
        ..plan_with_target(None)
    };
    let analyzer = ScriptedAnalyzer::new(plan);
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(100, 100), writer.clone());

    let result = assistant.run(RunRequest::new("just write some text")).await;

    assert!(!result.success);
    assert_eq!(result.summary, "No image source and screenshot not needed.");
    assert!(result.step(step_names::INSERT_INTO_DOCUMENT).is_none());
    assert_eq!(writer.paste_count(), 0);
    // parse_intent was still logged before the failure point.
    assert!(result.step(step_names::PARSE_INTENT).is_some());
}

/// Test: a writer failure is absorbed - the insert step carries the
/// error message as detail and the result is a non-throwing failure.
#[tokio::test]
async fn test_writer_failure_absorbed_into_result() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::failing("disk full"));
    let assistant = assistant(analyzer, SolidCapture::new(100, 100), writer);

    let result = assistant.run(RunRequest::new("capture the screen")).await;

    assert!(!result.success);
    let insert = result.step(step_names::INSERT_INTO_DOCUMENT).unwrap();
    assert_eq!(insert.status, StepStatus::Error);
    assert!(insert.detail.contains("disk full"));
    assert!(result.summary.contains("disk full"));
    // The partial trail still has every earlier stage.
    assert_eq!(
        step_names_of(&result),
        vec![
            step_names::PARSE_INTENT,
            step_names::ACQUIRE_IMAGE,
            step_names::LOCATE_REGION,
            step_names::CROP,
            step_names::INSERT_INTO_DOCUMENT,
        ]
    );
    // The cropped image survives for the caller even on failure.
    assert!(result.cropped_image.is_some());
}

/// Test: capture failure during acquire terminates the run with an
/// error step and no insertion.
#[tokio::test]
async fn test_capture_failure_terminates_run() {
    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::failing(), writer.clone());

    let result = assistant.run(RunRequest::new("capture the screen")).await;

    assert!(!result.success);
    let acquire = result.step(step_names::ACQUIRE_IMAGE).unwrap();
    assert_eq!(acquire.status, StepStatus::Error);
    assert!(acquire.detail.contains("screen capture failed"));
    assert_eq!(writer.paste_count(), 0);
}

/// Test: quick capture produces exactly two ok steps, screenshot then
/// paste.
#[tokio::test]
async fn test_quick_capture_two_steps() {
    let writer = Arc::new(MemoryWriter::new());
    let assistant = Assistant::new(
        Arc::new(SolidCapture::new(800, 600)),
        writer.clone(),
    );

    let result = assistant.quick_capture("output.docx", 0, None).await;

    assert!(result.success);
    assert_eq!(
        step_names_of(&result),
        vec![step_names::SCREENSHOT, step_names::PASTE]
    );
    assert!(result.steps.iter().all(|s| s.status == StepStatus::Ok));
    assert_eq!(writer.paste_count(), 1);
}

/// Test: the step callback observes every step in order.
#[tokio::test]
async fn test_step_callback_sees_every_step() {
    use std::sync::Mutex;

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_inner = seen.clone();

    let analyzer = ScriptedAnalyzer::new(plan_with_target(None));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = Assistant::new(Arc::new(SolidCapture::new(100, 100)), writer)
        .with_analyzer(Arc::new(analyzer))
        .with_step_callback(Box::new(move |log| {
            seen_inner.lock().unwrap().push(log.step.clone());
        }));

    let result = assistant.run(RunRequest::new("capture the screen")).await;

    assert!(result.success);
    assert_eq!(*seen.lock().unwrap(), step_names_of(&result));
}

/// Test: a degraded plan still drives a full successful run on the
/// default document.
#[tokio::test]
async fn test_degraded_plan_falls_back_to_defaults() {
    let analyzer = ScriptedAnalyzer::new(Plan::degraded(
        "I could not produce JSON",
        "unparseable analyzer response",
    ));
    let writer = Arc::new(MemoryWriter::new());
    let assistant = assistant(analyzer, SolidCapture::new(100, 100), writer.clone());

    let result = assistant.run(RunRequest::new("do something unclear")).await;

    assert!(result.success, "degraded plan must not crash the run");
    assert_eq!(
        result.output_path.as_deref().unwrap().to_str(),
        Some("output.docx")
    );
    let parse = result.step(step_names::PARSE_INTENT).unwrap();
    assert_eq!(parse.status, StepStatus::Ok);
    assert_eq!(parse.data["degraded"], "I could not produce JSON");
}
