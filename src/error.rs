use thiserror::Error;

/// Top-level error for a run. Each pipeline stage has its own error type
/// below; anything raised while a file is being processed is caught per
/// file, anything outside that (settings, folder creation) aborts the run.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Ledger write error: {0}")]
    Write(#[from] WriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T, E = TallyError> = std::result::Result<T, E>;

/// Raised while turning a receipt file into text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    Pdf(String),

    #[error("Page {page} rendering failed: {reason}")]
    Render { page: usize, reason: String },

    #[error("Image encoding failed: {0}")]
    Image(String),

    #[error("OCR request failed: {0}")]
    Ocr(String),
}

/// Raised while structuring extracted text with a model backend.
///
/// `Backend`, `NoJson`, `Json` and `Schema` describe a single attempt and
/// send the parser on to the next backend; `Exhausted` is terminal.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Backend call failed: {0}")]
    Backend(String),

    #[error("No JSON object found in response")]
    NoJson,

    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Response does not match the receipt schema: {0}")]
    Schema(String),

    #[error("All model attempts failed. Last error: {last}")]
    Exhausted { causes: Vec<String>, last: String },
}

/// Raised for a receipt the allocator cannot price.
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("Receipt has no items")]
    NoItems,

    #[error("Negative price for item '{0}'")]
    NegativePrice(String),

    #[error("Negative tax total: {0}")]
    NegativeTax(f64),
}

/// Raised when the spreadsheet append fails.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Append request failed: {0}")]
    Request(String),

    #[error("Spreadsheet API returned status {status}: {body}")]
    Api { status: u16, body: String },
}
