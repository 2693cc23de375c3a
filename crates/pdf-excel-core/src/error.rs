use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("failed to write spreadsheet: {0}")]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("spreadsheet contains no worksheets")]
    NoWorksheets,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("no tables or text found in PDF; it may be empty or image-only")]
    NoContent,

    #[error("refusing to write a workbook without sheets")]
    EmptyWorkbook,

    #[error("table on page {page} is too ambiguous (confidence={confidence:.2})")]
    AmbiguousTable { page: u32, confidence: f32 },
}

impl ConvertError {
    /// True when the document was readable but held nothing worth exporting.
    #[must_use]
    pub fn is_empty_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }
}
