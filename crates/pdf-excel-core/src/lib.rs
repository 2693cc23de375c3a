//! PDF ↔ spreadsheet conversion.
//!
//! The PDF direction extracts column-aligned tables from the page text and
//! falls back to per-page tables or plain text lines; the reverse direction
//! renders the first worksheet of a workbook as one grid table.

mod convert;
mod error;
mod extract;
mod model;
mod options;
mod pdf_reader;
mod pdf_render;
mod spreadsheet_reader;
mod table_detect;
mod table_parse;
mod warning;
mod workbook;

pub use convert::{ConversionReport, excel_to_pdf, pdf_to_excel};
pub use error::ConvertError;
pub use extract::{Extraction, ExtractionPath, MAX_SHEET_NAME_CHARS, extract_tables};
pub use model::{
    CONTENT_COLUMN, DocumentText, ExtractedContent, ExtractedTable, PageText, PdfText,
    RenderedReport, TabularData,
};
pub use options::{ExtractOptions, PageSelection, QualityMode};
pub use pdf_reader::{read_pdf, read_pdf_bytes};
pub use pdf_render::{render_table, render_table_to_bytes};
pub use spreadsheet_reader::read_first_sheet;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};
pub use workbook::{sheet_names, workbook_to_bytes, write_workbook};
