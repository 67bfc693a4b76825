use std::path::Path;

use crate::error::ExtractionError;
use crate::pdf;

/// File extensions the pipeline will pick up.
pub const RECEIPT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "webp", "pdf"];

pub fn is_receipt_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RECEIPT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// OCR over raw image bytes. An image with no recognizable text yields an
/// empty string, not an error.
pub trait OcrEngine {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// Turns a document into one encoded image per page for the OCR path.
pub trait PageRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<Vec<u8>>, ExtractionError>;
}

/// Turns a receipt file into raw text. PDFs with an embedded text layer
/// are read directly; everything else goes through rasterize + OCR.
pub struct Extractor {
    ocr: Box<dyn OcrEngine>,
    rasterizer: Box<dyn PageRasterizer>,
}

impl Extractor {
    pub fn new(ocr: Box<dyn OcrEngine>, rasterizer: Box<dyn PageRasterizer>) -> Self {
        Self { ocr, rasterizer }
    }

    pub fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            let pages = pdf::text_layer_pages(path)?;
            if pdf::has_text_layer(&pages) {
                return Ok(pages.join("\n"));
            }

            let images = self.rasterizer.rasterize(path)?;
            let mut texts = Vec::with_capacity(images.len());
            for image in &images {
                texts.push(self.ocr.recognize(image)?);
            }
            Ok(texts.join("\n"))
        } else {
            let bytes = std::fs::read(path)?;
            self.ocr.recognize(&bytes)
        }
    }
}
