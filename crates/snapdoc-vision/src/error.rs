//! Error types for analyzer configuration and transport.
//!
//! These surface at construction time or inside internal calls only;
//! the `VisionAnalyzer` trait boundary itself never returns an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("missing API key: set OPENROUTER_API_KEY or pass one explicitly")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned no message content")]
    EmptyResponse,
}

/// Result type for analyzer-internal operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
