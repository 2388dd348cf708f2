//! Analyzer output: candidate regions and the locate outcome.

use crate::region::Region;
use serde::{Deserialize, Serialize};

/// One candidate region reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRegion {
    /// What the analyzer believes this region contains.
    pub label: String,

    /// Pixel coordinates within the analyzed image.
    pub region: Region,

    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
}

/// Structured result of one remote analysis call.
///
/// The raw response text is kept for diagnostics; `metadata` carries
/// free-form facts such as whether the model claims it found anything,
/// or an `error` entry when the response could not be parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Free-text description of the image (may be empty).
    #[serde(default)]
    pub description: String,

    /// Candidate regions in the order the analyzer returned them.
    #[serde(default)]
    pub regions: Vec<CandidateRegion>,

    /// Unparsed response text, kept for diagnostics.
    #[serde(default)]
    pub raw_response: String,

    /// Free-form metadata (e.g. `{"found": true}`).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AnalysisResult {
    /// The highest-confidence candidate, or `None` when there are no
    /// candidates. Ties resolve to the first maximal element, so the
    /// selection is stable over the underlying order and repeated
    /// calls return the same candidate.
    pub fn best_region(&self) -> Option<&CandidateRegion> {
        self.regions.iter().reduce(|best, candidate| {
            if candidate.confidence > best.confidence {
                candidate
            } else {
                best
            }
        })
    }
}

/// Outcome of the locate stage.
///
/// An explicit two-variant type rather than an `Option`: "the analyzer
/// looked and found nothing" is an expected, non-exceptional outcome
/// that the pipeline threads through its control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    /// A region was located; the crop stage will use it.
    Located(CandidateRegion),

    /// No usable region; the pipeline proceeds with the full image.
    NotLocated,
}
