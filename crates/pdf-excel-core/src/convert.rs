use std::path::Path;

use tracing::{info, warn};

use crate::error::ConvertError;
use crate::extract::{ExtractionPath, extract_tables};
use crate::model::RenderedReport;
use crate::options::ExtractOptions;
use crate::pdf_reader::read_pdf;
use crate::pdf_render::render_table;
use crate::spreadsheet_reader::read_first_sheet;
use crate::warning::ExtractWarning;
use crate::workbook::{sheet_names, write_workbook};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub path: ExtractionPath,
    pub sheet_names: Vec<String>,
    pub row_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

impl ConversionReport {
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.sheet_names.len()
    }
}

/// PDF in, one worksheet per extracted table out. Nothing is written when
/// extraction fails.
pub fn pdf_to_excel(
    input_pdf: &Path,
    output_xlsx: &Path,
    options: &ExtractOptions,
) -> Result<ConversionReport, ConvertError> {
    let pdf = read_pdf(input_pdf, options.pages.as_ref())?;
    let extraction = extract_tables(&pdf, options)?;
    for warning in &extraction.warnings {
        warn!(%warning, "extraction warning");
    }

    write_workbook(output_xlsx, &extraction.tables)?;

    let report = ConversionReport {
        path: extraction.path,
        sheet_names: sheet_names(&extraction.tables),
        row_count: extraction.tables.iter().map(|table| table.row_count()).sum(),
        warnings: extraction.warnings,
    };
    info!(
        path = report.path.as_str(),
        sheets = report.table_count(),
        rows = report.row_count,
        "pdf converted to workbook"
    );
    Ok(report)
}

/// First worksheet in, single-table PDF out.
pub fn excel_to_pdf(input_sheet: &Path, output_pdf: &Path) -> Result<RenderedReport, ConvertError> {
    let data = read_first_sheet(input_sheet)?;
    let report = render_table(output_pdf, &data)?;
    info!(
        pages = report.page_count,
        rows = report.row_count,
        "worksheet rendered to pdf"
    );
    Ok(report)
}
