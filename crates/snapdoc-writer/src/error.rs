use snapdoc_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error(transparent)]
    Format(#[from] CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("slide {index} does not exist (presentation has {available})")]
    MissingSlide { index: usize, available: usize },

    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

pub type Result<T> = std::result::Result<T, WriterError>;
