//! Document insertion backends for snapdoc.
//!
//! [`SnapdocWriter`] implements the pipeline's `DocumentWriter`
//! contract for three target formats:
//! - `.docx` and `.pptx`: OOXML zip surgery. The package is rewritten
//!   with the image as a media part, a relationship entry, and a
//!   drawing element spliced into the body or slide shape tree. A
//!   missing target becomes a minimal valid skeleton package.
//! - `.md`: a base64 data URL appended inline, or a sidecar PNG with a
//!   relative reference.

mod docx;
mod error;
mod markdown;
mod ooxml;
mod pptx;
mod writer;

pub use error::{Result, WriterError};
pub use writer::SnapdocWriter;
