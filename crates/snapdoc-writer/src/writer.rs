//! The concrete `DocumentWriter` backing the pipeline.

use crate::error::Result;
use crate::{docx, markdown, pptx};
use snapdoc_core::{
    DocumentFormat, DocumentWriter, ImageSource, PasteOutput, PasteRequest,
};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// Writes images into docx, pptx and markdown targets on the local
/// filesystem. Stateless; one instance serves any number of pastes.
#[derive(Debug, Default, Clone)]
pub struct SnapdocWriter;

impl SnapdocWriter {
    pub fn new() -> Self {
        Self
    }

    /// Current bytes of the target, or `None` when it does not exist
    /// yet and a skeleton document should be built.
    fn read_target(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Normalize the source image to PNG and report its pixel size.
    ///
    /// The pipeline always hands over PNG, but a paste from an
    /// arbitrary file path may be any decodable format.
    fn load_png(source: &ImageSource) -> Result<(Vec<u8>, u32, u32)> {
        let raw = match source {
            ImageSource::Bytes(bytes) => bytes.clone(),
            ImageSource::Path(path) => fs::read(path)?,
        };
        let decoded = image::load_from_memory(&raw)?;
        let (width, height) = (decoded.width(), decoded.height());
        let png = if raw.starts_with(b"\x89PNG") {
            raw
        } else {
            let mut bytes = Vec::new();
            decoded.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            bytes
        };
        Ok((png, width, height))
    }

    fn paste_typed(&self, request: &PasteRequest) -> Result<PasteOutput> {
        let format = match request.format {
            Some(format) => format,
            None => DocumentFormat::from_path(&request.target)?,
        };
        let (png, width, height) = Self::load_png(&request.image)?;

        let output = match format {
            DocumentFormat::Docx => docx::paste(
                Self::read_target(&request.target)?.as_deref(),
                &png,
                (width, height),
                request.position.as_ref(),
                request.size,
                &request.alt_text,
            )?,
            DocumentFormat::Pptx => pptx::paste(
                Self::read_target(&request.target)?.as_deref(),
                &png,
                (width, height),
                request.position.as_ref(),
                request.size,
                &request.alt_text,
            )?,
            DocumentFormat::Markdown => {
                let existing = match fs::read_to_string(&request.target) {
                    Ok(text) => text,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                    Err(e) => return Err(e.into()),
                };
                let (content, sidecar) = markdown::paste(
                    &existing,
                    &request.target,
                    &png,
                    request.position.as_ref(),
                    request.embed,
                    &request.alt_text,
                )?;
                if let Some((name, bytes)) = sidecar {
                    let dir = request.target.parent().unwrap_or(Path::new("."));
                    fs::write(dir.join(name), bytes)?;
                }
                content.into_bytes()
            }
        };

        if let Some(parent) = request.target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&request.target, &output)?;
        info!(
            target = %request.target.display(),
            %format,
            bytes = output.len(),
            "image pasted"
        );
        Ok(PasteOutput { output, format })
    }
}

impl DocumentWriter for SnapdocWriter {
    fn paste(&self, request: &PasteRequest) -> anyhow::Result<PasteOutput> {
        Ok(self.paste_typed(request)?)
    }

    fn supported_formats(&self) -> Vec<DocumentFormat> {
        vec![
            DocumentFormat::Docx,
            DocumentFormat::Pptx,
            DocumentFormat::Markdown,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriterError;

    fn png_2x1() -> Vec<u8> {
        let image = image::DynamicImage::new_rgba8(2, 1);
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let writer = SnapdocWriter::new();
        let request = PasteRequest::new(ImageSource::Bytes(png_2x1()), "out.xls");
        let err = writer.paste_typed(&request).unwrap_err();
        assert!(matches!(err, WriterError::Format(_)));
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("notes.txt");
        let mut request = PasteRequest::new(ImageSource::Bytes(png_2x1()), &target);
        request.format = Some(DocumentFormat::Markdown);
        let output = SnapdocWriter::new().paste_typed(&request).unwrap();
        assert_eq!(output.format, DocumentFormat::Markdown);
        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains("data:image/png;base64,"));
    }

    #[test]
    fn test_markdown_paste_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("notes.md");
        let writer = SnapdocWriter::new();
        let request = PasteRequest::new(ImageSource::Bytes(png_2x1()), &target);
        writer.paste_typed(&request).unwrap();
        writer.paste_typed(&request).unwrap();
        let written = fs::read_to_string(&target).unwrap();
        assert_eq!(written.matches("![image]").count(), 2);
    }

    #[test]
    fn test_markdown_reference_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("notes.md");
        let mut request = PasteRequest::new(ImageSource::Bytes(png_2x1()), &target);
        request.embed = false;
        SnapdocWriter::new().paste_typed(&request).unwrap();
        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains("![image](notes-1.png)"));
        assert!(dir.path().join("notes-1.png").exists());
    }

    #[test]
    fn test_docx_paste_creates_new_package() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report.docx");
        let output = SnapdocWriter::new()
            .paste_typed(&PasteRequest::new(ImageSource::Bytes(png_2x1()), &target))
            .unwrap();
        assert_eq!(output.format, DocumentFormat::Docx);
        assert!(target.exists());
        // Written bytes are a readable zip with the media part inside.
        let package = crate::ooxml::Package::from_bytes(&output.output).unwrap();
        assert!(package.get("word/media/image1.png").is_some());
    }

    #[test]
    fn test_pptx_paste_creates_new_deck() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("slides.pptx");
        let output = SnapdocWriter::new()
            .paste_typed(&PasteRequest::new(ImageSource::Bytes(png_2x1()), &target))
            .unwrap();
        assert_eq!(output.format, DocumentFormat::Pptx);
        let package = crate::ooxml::Package::from_bytes(&output.output).unwrap();
        assert!(package.get_text("ppt/slides/slide1.xml").unwrap().contains("<p:pic>"));
    }

    #[test]
    fn test_image_from_path_source() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("shot.png");
        fs::write(&image_path, png_2x1()).unwrap();
        let target = dir.path().join("notes.md");
        let request = PasteRequest::new(ImageSource::Path(image_path), &target);
        SnapdocWriter::new().paste_typed(&request).unwrap();
        assert!(target.exists());
    }
}
