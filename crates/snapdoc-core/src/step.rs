//! Per-stage audit records for one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed stage names, in pipeline order.
pub mod step_names {
    pub const PARSE_INTENT: &str = "parse_intent";
    pub const ACQUIRE_IMAGE: &str = "acquire_image";
    pub const LOCATE_REGION: &str = "locate_region";
    pub const CROP: &str = "crop";
    pub const INSERT_INTO_DOCUMENT: &str = "insert_into_document";

    // Quick-capture shortcut stages.
    pub const SCREENSHOT: &str = "screenshot";
    pub const PASTE: &str = "paste";
}

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Error,
    Skipped,
}

/// One append-only record per pipeline stage.
///
/// The ordered sequence of these for a run is its full audit trail,
/// produced even on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLog {
    /// Stage name (one of [`step_names`]).
    pub step: String,

    /// Outcome of the stage.
    pub status: StepStatus,

    /// Human-readable detail.
    #[serde(default)]
    pub detail: String,

    /// Wall-clock duration of the stage.
    #[serde(default)]
    pub duration_ms: u64,

    /// Auxiliary structured data (plan, coordinates, source, ...).
    #[serde(default)]
    pub data: serde_json::Value,

    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl StepLog {
    /// Record with `ok` status and no duration.
    pub fn ok(step: &str, detail: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Ok, detail)
    }

    /// Record with `skipped` status.
    pub fn skipped(step: &str, detail: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Skipped, detail)
    }

    /// Record with `error` status.
    pub fn error(step: &str, detail: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Error, detail)
    }

    fn new(step: &str, status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            status,
            detail: detail.into(),
            duration_ms: 0,
            data: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach a measured duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Attach auxiliary data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
