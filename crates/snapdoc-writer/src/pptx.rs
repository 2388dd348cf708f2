//! Image insertion for PresentationML (.pptx) packages.

use crate::error::{Result, WriterError};
use crate::ooxml::{
    append_relationship, display_size_emu, ensure_png_content_type, next_relationship_id,
    Package, EMU_PER_INCH,
};
use snapdoc_core::{Position, SizeHint};
use tracing::debug;

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Top-left offset of a pasted picture, one inch in from the corner.
const PICTURE_OFFSET_EMU: i64 = EMU_PER_INCH;

const SKELETON_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/></Types>"#;

const SKELETON_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

const SKELETON_PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#;

const SKELETON_PRESENTATION_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#;

const SKELETON_SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:sld>"#;

const SKELETON_SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

const SKELETON_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld></p:sldLayout>"#;

const SKELETON_LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const SKELETON_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const SKELETON_MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const SKELETON_THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="snapdoc"><a:themeElements><a:clrScheme name="snapdoc"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="snapdoc"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="snapdoc"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

/// A new single-slide deck.
fn skeleton() -> Package {
    let mut package = Package::empty();
    package.put("[Content_Types].xml", SKELETON_CONTENT_TYPES.into());
    package.put("_rels/.rels", SKELETON_ROOT_RELS.into());
    package.put("ppt/presentation.xml", SKELETON_PRESENTATION.into());
    package.put(
        "ppt/_rels/presentation.xml.rels",
        SKELETON_PRESENTATION_RELS.into(),
    );
    package.put("ppt/slides/slide1.xml", SKELETON_SLIDE.into());
    package.put("ppt/slides/_rels/slide1.xml.rels", SKELETON_SLIDE_RELS.into());
    package.put("ppt/slideLayouts/slideLayout1.xml", SKELETON_LAYOUT.into());
    package.put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SKELETON_LAYOUT_RELS.into(),
    );
    package.put("ppt/slideMasters/slideMaster1.xml", SKELETON_MASTER.into());
    package.put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SKELETON_MASTER_RELS.into(),
    );
    package.put("ppt/theme/theme1.xml", SKELETON_THEME.into());
    package
}

/// Number of `ppt/slides/slideN.xml` parts in the package.
fn slide_count(package: &Package) -> usize {
    package
        .names()
        .filter(|name| {
            name.strip_prefix("ppt/slides/slide")
                .is_some_and(|rest| rest.ends_with(".xml") && !rest.contains('/'))
        })
        .count()
}

/// A `p:pic` element referencing the embedded image part.
fn picture_element(rel_id: &str, shape_id: usize, alt: &str, cx: i64, cy: i64) -> String {
    let alt = xml_escape(alt);
    format!(
        concat!(
            "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"{alt}\" descr=\"{alt}\"/>",
            "<p:cNvPicPr/><p:nvPr/></p:nvPicPr>",
            "<p:blipFill><a:blip r:embed=\"{rid}\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch></p:blipFill>",
            "<p:spPr><a:xfrm><a:off x=\"{off}\" y=\"{off}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>",
        ),
        id = shape_id,
        alt = alt,
        rid = rel_id,
        off = PICTURE_OFFSET_EMU,
        cx = cx,
        cy = cy,
    )
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Embed a PNG into a .pptx package and splice a picture shape into one
/// slide's shape tree.
///
/// Slide numbers are 1-indexed; without a `Position::Slide` the last
/// slide receives the picture. A slide number past the end of an
/// existing deck is a typed error. `None` for `existing` builds a new
/// single-slide deck.
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

    let available = slide_count(&package);
    if available == 0 {
        return Err(WriterError::MalformedDocument(
            "presentation has no slides".to_string(),
        ));
    }
    let slide_number = match position {
        Some(Position::Slide(n)) => {
            if *n == 0 || *n > available {
                return Err(WriterError::MissingSlide {
                    index: *n,
                    available,
                });
            }
            *n
        }
        _ => available,
    };
    debug!(slide_number, available, "pasting into slide");

    let media_index = package.next_media_index("ppt/media");
    let media_name = format!("ppt/media/image{media_index}.png");
    package.put(&media_name, png.to_vec());

    let rels_name = format!("ppt/slides/_rels/slide{slide_number}.xml.rels");
    let rels = match package.get(&rels_name) {
        Some(_) => package.get_text(&rels_name)?,
        None => SKELETON_SLIDE_RELS.to_string(),
    };
    let rel_id = format!("rId{}", next_relationship_id(&rels));
    let target = format!("../media/image{media_index}.png");
    package.put(
        &rels_name,
        append_relationship(&rels, &rel_id, IMAGE_REL_TYPE, &target).into_bytes(),
    );

    let content_types = package.get_text("[Content_Types].xml")?;
    package.put(
        "[Content_Types].xml",
        ensure_png_content_type(&content_types).into_bytes(),
    );

    let (cx, cy) = display_size_emu(pixel_size.0, pixel_size.1, size);
    // Shape ids only need to be unique within the slide; offset past
    // the skeleton ids.
    let picture = picture_element(&rel_id, media_index + 10, alt, cx, cy);

    let slide_name = format!("ppt/slides/slide{slide_number}.xml");
    let slide = package.get_text(&slide_name)?;
    if !slide.contains("</p:spTree>") {
        return Err(WriterError::MalformedDocument(format!(
            "{slide_name} has no shape tree"
        )));
    }
    package.put(
        &slide_name,
        slide
            .replacen("</p:spTree>", &format!("{picture}</p:spTree>"), 1)
            .into_bytes(),
    );

    package.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_1x1() -> Vec<u8> {
        let image = image::DynamicImage::new_rgba8(1, 1);
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[test]
    fn test_paste_into_new_deck() {
        let bytes = paste(None, &png_1x1(), (1, 1), None, None, "figure").unwrap();
        let package = Package::from_bytes(&bytes).unwrap();
        assert!(package.get("ppt/media/image1.png").is_some());
        let slide = package.get_text("ppt/slides/slide1.xml").unwrap();
        assert!(slide.contains("<p:pic>"));
        assert!(slide.contains("name=\"figure\""));
        let rels = package
            .get_text("ppt/slides/_rels/slide1.xml.rels")
            .unwrap();
        assert!(rels.contains("../media/image1.png"));
    }

    #[test]
    fn test_explicit_slide_number_is_validated() {
        let deck = paste(None, &png_1x1(), (1, 1), None, None, "a").unwrap();
        let err = paste(
            Some(&deck),
            &png_1x1(),
            (1, 1),
            Some(&Position::Slide(3)),
            None,
            "b",
        )
        .unwrap_err();
        match err {
            WriterError::MissingSlide { index, available } => {
                assert_eq!(index, 3);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_slide_zero_is_rejected() {
        let deck = paste(None, &png_1x1(), (1, 1), None, None, "a").unwrap();
        assert!(matches!(
            paste(
                Some(&deck),
                &png_1x1(),
                (1, 1),
                Some(&Position::Slide(0)),
                None,
                "b"
            ),
            Err(WriterError::MissingSlide { .. })
        ));
    }

    #[test]
    fn test_repeat_paste_appends_to_shape_tree() {
        let first = paste(None, &png_1x1(), (1, 1), None, None, "a").unwrap();
        let second = paste(
            Some(&first),
            &png_1x1(),
            (1, 1),
            Some(&Position::Slide(1)),
            None,
            "b",
        )
        .unwrap();
        let slide = Package::from_bytes(&second)
            .unwrap()
            .get_text("ppt/slides/slide1.xml")
            .unwrap();
        assert_eq!(slide.matches("<p:pic>").count(), 2);
        let rels = Package::from_bytes(&second)
            .unwrap()
            .get_text("ppt/slides/_rels/slide1.xml.rels")
            .unwrap();
        assert!(rels.contains("../media/image2.png"));
    }
}
