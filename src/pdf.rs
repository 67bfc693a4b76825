use std::io::Cursor;
use std::path::Path;

use pdfium_render::prelude::*;

use crate::error::ExtractionError;
use crate::extractor::PageRasterizer;

/// Width rendered pages are scaled to for OCR. Receipts are narrow;
/// 1600px keeps small print legible without ballooning the upload.
const RENDER_TARGET_WIDTH: i32 = 1600;
const RENDER_MAX_HEIGHT: i32 = 4096;

/// Per-page embedded text, in page order. Empty or whitespace-only pages
/// mean the document has no usable text layer.
pub fn text_layer_pages(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let bytes = std::fs::read(path)?;
    pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))
}

pub fn has_text_layer(pages: &[String]) -> bool {
    pages.iter().any(|p| !p.trim().is_empty())
}

/// Renders PDF pages to JPEG via PDFium for the OCR path.
///
/// The `Pdfium` handle is loaded per call because the upstream type is
/// `!Send`; the OS caches the dlopen, so repeat loads are near-free.
pub struct PdfiumRasterizer;

fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| ExtractionError::Render {
            page: 0,
            reason: format!("Failed to load PDFium from {path}: {e}"),
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| ExtractionError::Render {
        page: 0,
        reason: format!("PDFium library not found (set PDFIUM_DYNAMIC_LIB_PATH): {e}"),
    })?;
    Ok(Pdfium::new(bindings))
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<Vec<u8>>, ExtractionError> {
        let bytes = std::fs::read(path)?;
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| ExtractionError::Pdf(format!("Failed to load PDF: {e}")))?;

        let config = PdfRenderConfig::new()
            .set_target_width(RENDER_TARGET_WIDTH)
            .set_maximum_height(RENDER_MAX_HEIGHT);

        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ExtractionError::Render {
                    page: index,
                    reason: e.to_string(),
                })?;

            let mut cursor = Cursor::new(Vec::new());
            bitmap
                .as_image()
                .to_rgb8()
                .write_to(&mut cursor, image::ImageFormat::Jpeg)
                .map_err(|e| ExtractionError::Image(e.to_string()))?;
            pages.push(cursor.into_inner());
        }

        Ok(pages)
    }
}

/// Build a one-page PDF with lopdf, optionally carrying text. Shared by
/// the extractor and pipeline tests.
#[cfg(test)]
pub(crate) fn make_test_pdf(text: Option<&str>) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = match text {
        Some(t) => format!("BT /F1 12 Tf 100 700 Td ({t}) Tj ET"),
        None => String::new(),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
