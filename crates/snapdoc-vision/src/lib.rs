//! Remote multimodal analysis for snapdoc.
//!
//! Talks to an OpenAI-compatible gateway (OpenRouter by default) and
//! turns model responses into the structured [`Plan`] and
//! [`AnalysisResult`](snapdoc_core::AnalysisResult) values the
//! pipeline consumes. Responses are parsed tolerantly: strict JSON
//! first, then fenced code blocks, then the widest brace span, and
//! finally a degraded value that keeps the raw text for diagnostics.
//!
//! [`Plan`]: snapdoc_core::Plan

mod error;
mod gateway;
mod parse;
mod prompts;

pub use error::{AnalyzerError, Result};
pub use gateway::{AnalyzerConfig, GatewayAnalyzer};
pub use parse::{parse_model_json, ParsedResponse};
