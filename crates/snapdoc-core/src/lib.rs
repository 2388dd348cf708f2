//! snapdoc-core - pipeline orchestration for the snapdoc assistant
//!
//! The core of snapdoc: a deterministic, linear pipeline that turns a
//! natural-language instruction into an image insertion:
//! - Parse intent into a [`Plan`]
//! - Acquire an image (provided bytes, provided path, or a capture)
//! - Locate the target region via the analyzer, pick the best candidate
//! - Clamp and crop
//! - Hand the result to the document writer
//!
//! Collaborators (capture, analyzer, writer) are injected as trait
//! objects; `fakes` provides deterministic substitutes for tests.

pub mod analysis;
pub mod assistant;
pub mod error;
pub mod fakes;
pub mod plan;
pub mod raster;
pub mod region;
pub mod step;
pub mod traits;

// Re-export key types
pub use analysis::{AnalysisResult, CandidateRegion, LocateOutcome};
pub use assistant::{Assistant, AssistantResult, RunRequest, StepCallback};
pub use error::CoreError;
pub use plan::{Plan, Position, SizeHint};
pub use region::Region;
pub use step::{step_names, StepLog, StepStatus};
pub use traits::{
    DocumentFormat, DocumentWriter, ImageSource, PasteOutput, PasteRequest, ScreenCapture,
    VisionAnalyzer,
};
