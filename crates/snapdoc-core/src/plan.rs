//! Structured intent derived from a natural-language instruction.

use serde::{Deserialize, Serialize};

/// Logical insertion position inside a target document.
///
/// Externally tagged so the analyzer's `{"paragraph": 3}`,
/// `{"slide": 2}` and `{"after_heading": "Results"}` shapes
/// deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Paragraph index in a flowing-text document (0-indexed).
    Paragraph(usize),

    /// Slide number in a presentation (1-indexed).
    Slide(usize),

    /// Insert after the first heading with this text.
    AfterHeading(String),
}

/// Physical size hint for the inserted image, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeHint {
    #[serde(default)]
    pub width: Option<f64>,

    #[serde(default)]
    pub height: Option<f64>,
}

impl SizeHint {
    pub fn width(width: f64) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }
}

/// The analyzer's decision about what the user wants, parsed from the
/// instruction text alone, before any image exists.
///
/// Every field degrades to a documented default when missing, so a
/// partially parseable response still yields a usable plan. When the
/// response could not be parsed at all, [`Plan::degraded`] produces a
/// best-effort plan carrying the raw text in `degraded` instead of
/// failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Whether a fresh screen capture is required.
    #[serde(default = "default_needs_screenshot")]
    pub needs_screenshot: bool,

    /// What to look for on screen, if anything.
    #[serde(default)]
    pub target_element: Option<String>,

    /// Output document path.
    #[serde(default = "default_target_document")]
    pub target_document: String,

    /// Explicit format override (e.g. "docx"), if the instruction named one.
    #[serde(default)]
    pub target_format: Option<String>,

    /// Where in the document to insert the image.
    #[serde(default)]
    pub position: Option<Position>,

    /// Physical size hint for the inserted image.
    #[serde(default)]
    pub size: Option<SizeHint>,

    /// The analyzer's stated understanding of the task.
    #[serde(default)]
    pub reasoning: String,

    /// Raw analyzer response, present only when parsing fell back to
    /// defaults. Diagnostic, never consumed by the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

fn default_needs_screenshot() -> bool {
    true
}

fn default_target_document() -> String {
    "output.docx".to_string()
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            needs_screenshot: default_needs_screenshot(),
            target_element: None,
            target_document: default_target_document(),
            target_format: None,
            position: None,
            size: None,
            reasoning: String::new(),
            degraded: None,
        }
    }
}

impl Plan {
    /// Best-effort plan for an unparseable analyzer response.
    ///
    /// All fields take their defaults; `reasoning` states the
    /// diagnostic and `degraded` keeps the raw text.
    pub fn degraded(raw: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            reasoning: diagnostic.into(),
            degraded: Some(raw.into()),
            ..Self::default()
        }
    }

    /// Whether this plan was produced by the degraded fallback path.
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_defaults() {
        let plan = Plan::default();
        assert!(plan.needs_screenshot);
        assert_eq!(plan.target_document, "output.docx");
        assert!(plan.target_element.is_none());
        assert!(!plan.is_degraded());
    }

    #[test]
    fn test_plan_from_partial_json() {
        let plan: Plan = serde_json::from_value(serde_json::json!({
            "target_element": "revenue chart",
            "target_document": "report.docx",
        }))
        .unwrap();
        assert!(plan.needs_screenshot);
        assert_eq!(plan.target_element.as_deref(), Some("revenue chart"));
        assert_eq!(plan.target_document, "report.docx");
    }

    #[test]
    fn test_position_shapes_deserialize() {
        let p: Position = serde_json::from_value(serde_json::json!({"paragraph": 3})).unwrap();
        assert_eq!(p, Position::Paragraph(3));
        let s: Position = serde_json::from_value(serde_json::json!({"slide": 2})).unwrap();
        assert_eq!(s, Position::Slide(2));
        let h: Position =
            serde_json::from_value(serde_json::json!({"after_heading": "Results"})).unwrap();
        assert_eq!(h, Position::AfterHeading("Results".to_string()));
    }

    #[test]
    fn test_degraded_plan_keeps_raw() {
        let plan = Plan::degraded("not json at all", "unparseable analyzer response");
        assert!(plan.is_degraded());
        assert_eq!(plan.degraded.as_deref(), Some("not json at all"));
        assert_eq!(plan.target_document, "output.docx");
    }
}
