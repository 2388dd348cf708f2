//! Image insertion for WordprocessingML (.docx) packages.

use crate::error::Result;
use crate::ooxml::{
    append_relationship, display_size_emu, ensure_png_content_type, next_relationship_id, Package,
};
use snapdoc_core::{Position, SizeHint};
use tracing::debug;

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const SKELETON_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const SKELETON_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const SKELETON_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body></w:body></w:document>"#;

const SKELETON_DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// A new single-part document with an empty body.
fn skeleton() -> Package {
    let mut package = Package::empty();
    package.put("[Content_Types].xml", SKELETON_CONTENT_TYPES.into());
    package.put("_rels/.rels", SKELETON_ROOT_RELS.into());
    package.put("word/document.xml", SKELETON_DOCUMENT.into());
    package.put("word/_rels/document.xml.rels", SKELETON_DOCUMENT_RELS.into());
    package
}

/// An inline-drawing paragraph referencing the embedded image part.
fn drawing_paragraph(rel_id: &str, doc_pr_id: usize, alt: &str, cx: i64, cy: i64) -> String {
    let alt = xml_escape(alt);
    format!(
        concat!(
            "<w:p><w:r><w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"{alt}\" descr=\"{alt}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{alt}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rid}\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>",
        ),
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        alt = alt,
        rid = rel_id,
    )
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Byte offset just past the nth (0-indexed) `</w:p>` in the body, if
/// that many paragraphs exist.
fn offset_after_paragraph(document: &str, index: usize) -> Option<usize> {
    document
        .match_indices("</w:p>")
        .nth(index)
        .map(|(at, close)| at + close.len())
}

/// Insertion offset for the requested position, falling back to the
/// end of the body when the position cannot be honored.
fn insertion_offset(document: &str, position: Option<&Position>) -> Option<usize> {
    match position {
        Some(Position::Paragraph(index)) => offset_after_paragraph(document, *index),
        Some(Position::AfterHeading(heading)) => {
            let at = document.find(heading.as_str())?;
            let rest = &document[at..];
            rest.find("</w:p>").map(|close| at + close + "</w:p>".len())
        }
        // Slide positions have no meaning in a flowing-text document.
        Some(Position::Slide(_)) | None => None,
    }
}

/// Embed a PNG into a .docx package and splice an inline drawing into
/// the body.
///
/// `existing` is the current package bytes; `None` builds a new
/// document from scratch. Unsatisfiable positions (index past the last
/// paragraph, heading not found) append at the end of the body rather
/// than failing.
pub fn paste(
    existing: Option<&[u8]>,
    png: &[u8],
    pixel_size: (u32, u32),
    position: Option<&Position>,
    size: Option<SizeHint>,
    alt: &str,
) -> Result<Vec<u8>> {
    let mut package = match existing {
        Some(bytes) => Package::from_bytes(bytes)?,
        None => skeleton(),
    };

    let media_index = package.next_media_index("word/media");
    let media_name = format!("word/media/image{media_index}.png");
    package.put(&media_name, png.to_vec());

    let rels = package.get_text("word/_rels/document.xml.rels")?;
    let rel_id = format!("rId{}", next_relationship_id(&rels));
    let target = format!("media/image{media_index}.png");
    package.put(
        "word/_rels/document.xml.rels",
        append_relationship(&rels, &rel_id, IMAGE_REL_TYPE, &target).into_bytes(),
    );

    let content_types = package.get_text("[Content_Types].xml")?;
    package.put(
        "[Content_Types].xml",
        ensure_png_content_type(&content_types).into_bytes(),
    );

    let (cx, cy) = display_size_emu(pixel_size.0, pixel_size.1, size);
    let drawing = drawing_paragraph(&rel_id, media_index, alt, cx, cy);

    let mut document = package.get_text("word/document.xml")?;
    match insertion_offset(&document, position) {
        Some(at) => {
            debug!(at, "splicing drawing at positioned offset");
            document.insert_str(at, &drawing);
        }
        None => {
            document = document.replacen("</w:body>", &format!("{drawing}</w:body>"), 1);
        }
    }
    package.put("word/document.xml", document.into_bytes());

    package.to_bytes()
}
