//! Error types for core operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unsupported document format: {extension:?} (supported: docx, pptx, md)")]
    UnsupportedFormat { extension: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
