//! Shared plumbing for OOXML containers.
//!
//! Both .docx and .pptx are zip packages of XML parts. Insertion works
//! by rewriting the package: copy every entry, add the image as a media
//! part, register a relationship, and splice a drawing element into the
//! body XML. String surgery on the part XML is deliberate; the parts we
//! touch are small and the markup we add is self-contained.

use crate::error::{Result, WriterError};
use snapdoc_core::SizeHint;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const EMU_PER_INCH: i64 = 914_400;

/// Display width when neither the plan nor the caller gave a size hint.
pub const DEFAULT_WIDTH_INCHES: f64 = 6.0;

/// An OOXML package held fully in memory as ordered (name, bytes) entries.
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }
        Ok(Self { entries })
    }

    /// Empty package, for building skeleton documents from scratch.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// UTF-8 text of a part, or a malformed-document error naming it.
    pub fn get_text(&self, name: &str) -> Result<String> {
        let data = self
            .get(name)
            .ok_or_else(|| WriterError::MalformedDocument(format!("missing part {name}")))?;
        String::from_utf8(data.to_vec())
            .map_err(|_| WriterError::MalformedDocument(format!("part {name} is not UTF-8")))
    }

    /// Replace an existing entry or append a new one.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = data;
        } else {
            self.entries.push((name.to_string(), data));
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Next free index for `<dir>/image<N>.<ext>` media parts.
    pub fn next_media_index(&self, dir: &str) -> usize {
        let prefix = format!("{dir}/image");
        self.names()
            .filter_map(|name| {
                let rest = name.strip_prefix(&prefix)?;
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<usize>().ok()
            })
            .max()
            .map_or(1, |max| max + 1)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &self.entries {
            writer.start_file(name.as_str(), SimpleFileOptions::default())?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

/// Display size in EMU for an image of the given pixel dimensions.
///
/// Explicit hints win; a missing axis is derived from the pixel aspect
/// ratio, and with no hint at all the image is laid out
/// [`DEFAULT_WIDTH_INCHES`] wide.
pub fn display_size_emu(pixel_width: u32, pixel_height: u32, hint: Option<SizeHint>) -> (i64, i64) {
    let aspect = if pixel_width == 0 {
        1.0
    } else {
        pixel_height as f64 / pixel_width as f64
    };
    let hint = hint.unwrap_or_default();
    let (width_in, height_in) = match (hint.width, hint.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * aspect),
        (None, Some(h)) => (if aspect == 0.0 { h } else { h / aspect }, h),
        (None, None) => (DEFAULT_WIDTH_INCHES, DEFAULT_WIDTH_INCHES * aspect),
    };
    (
        (width_in * EMU_PER_INCH as f64) as i64,
        (height_in * EMU_PER_INCH as f64) as i64,
    )
}

/// Ensure `[Content_Types].xml` declares a Default for png.
pub fn ensure_png_content_type(content_types: &str) -> String {
    if content_types.contains("Extension=\"png\"") {
        return content_types.to_string();
    }
    content_types.replacen(
        "</Types>",
        "<Default Extension=\"png\" ContentType=\"image/png\"/></Types>",
        1,
    )
}

/// Next free `rId<N>` in a relationships part.
pub fn next_relationship_id(rels: &str) -> usize {
    rels.match_indices("Id=\"rId")
        .filter_map(|(at, _)| {
            let rest = &rels[at + 7..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<usize>().ok()
        })
        .max()
        .map_or(1, |max| max + 1)
}

/// Append one `<Relationship>` element before the closing tag.
pub fn append_relationship(rels: &str, id: &str, type_uri: &str, target: &str) -> String {
    let element =
        format!("<Relationship Id=\"{id}\" Type=\"{type_uri}\" Target=\"{target}\"/></Relationships>");
    rels.replacen("</Relationships>", &element, 1)
}
