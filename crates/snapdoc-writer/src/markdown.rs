//! Image insertion for markdown files.
//!
//! Two modes: embed (base64 data URL inline, self-contained file) or
//! reference (PNG written as a sidecar next to the target, linked by
//! relative path).

use crate::error::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use snapdoc_core::Position;
use std::path::Path;
use tracing::debug;

/// The image line appended for an embedded paste.
fn embedded_line(alt: &str, png: &[u8]) -> String {
    format!("![{alt}](data:image/png;base64,{})", BASE64.encode(png))
}

/// Sidecar file name for a reference paste, derived from the target's
/// stem and kept unique against the existing content.
pub fn sidecar_name(target: &Path, existing: &str) -> String {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let mut index = 1;
    loop {
        let candidate = format!("{stem}-{index}.png");
        if !existing.contains(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Offset at which to splice the image block, or `None` for append.
fn insertion_offset(content: &str, position: Option<&Position>) -> Option<usize> {
    match position {
        Some(Position::AfterHeading(heading)) => {
            // Match a heading line, any level.
            let mut cursor = 0;
            for line in content.split_inclusive('\n') {
                let trimmed = line.trim_start_matches('#').trim();
                if line.starts_with('#') && trimmed == heading.trim() {
                    return Some(cursor + line.len());
                }
                cursor += line.len();
            }
            None
        }
        _ => None,
    }
}

/// Produce the new markdown content, plus the sidecar PNG to write
/// when not embedding.
///
/// The image block lands after the named heading when one matches, or
/// at the end of the file otherwise.
pub fn paste(
    existing: &str,
    target: &Path,
    png: &[u8],
    position: Option<&Position>,
    embed: bool,
    alt: &str,
) -> Result<(String, Option<(String, Vec<u8>)>)> {
    let (line, sidecar) = if embed {
        (embedded_line(alt, png), None)
    } else {
        let name = sidecar_name(target, existing);
        let line = format!("![{alt}]({name})");
        (line, Some((name, png.to_vec())))
    };
    let block = format!("\n{line}\n");

    let content = match insertion_offset(existing, position) {
        Some(at) => {
            debug!(at, "inserting image block after heading");
            let mut content = existing.to_string();
            content.insert_str(at, &block);
            content
        }
        None => {
            let mut content = existing.to_string();
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&block);
            content
        }
    };
    Ok((content, sidecar))
}
