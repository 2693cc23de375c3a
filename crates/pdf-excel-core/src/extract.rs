use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::model::{
    DetectedTable, DocumentText, ExtractedContent, ExtractedTable, PageText, PdfText,
};
use crate::options::{ExtractOptions, QualityMode};
use crate::table_detect::{LOW_CONFIDENCE_THRESHOLD, detect_page_tables, detect_tables};
use crate::table_parse::text_lines;
use crate::warning::{ExtractWarning, WarningCode};

pub const MAX_SHEET_NAME_CHARS: usize = 31;

const SINGLE_TABLE_NAME: &str = "Sheet1";
const PAGE_TABLE_NAME: &str = "Table";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Structured,
    PageFallback,
}

impl ExtractionPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::PageFallback => "page-fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub tables: Vec<ExtractedTable>,
    pub path: ExtractionPath,
    pub warnings: Vec<ExtractWarning>,
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn apply_quality_mode(
    tables: Vec<DetectedTable>,
    mode: QualityMode,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<DetectedTable>, ConvertError> {
    let mut out = Vec::new();

    for table in tables {
        if table.confidence >= LOW_CONFIDENCE_THRESHOLD {
            out.push(table);
            continue;
        }

        match mode {
            QualityMode::BestEffort => {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "table confidence is low; exported in best-effort mode",
                    )
                    .with_page(table.page)
                    .with_confidence(table.confidence),
                );
                out.push(table);
            }
            QualityMode::Strict => {
                return Err(ConvertError::AmbiguousTable {
                    page: table.page,
                    confidence: table.confidence,
                });
            }
            QualityMode::SkipAmbiguous => {
                warnings.push(
                    ExtractWarning::new(WarningCode::LowConfidence, "skipping low-confidence table")
                        .with_page(table.page)
                        .with_confidence(table.confidence),
                );
            }
        }
    }

    Ok(out)
}

/// Column-aligned tables across every page, retried once on the
/// whole-document layout text when the per-page texts yield nothing.
fn structured_pass(
    pdf: &PdfText,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<ExtractedContent>, ConvertError> {
    let mut raw_tables = detect_tables(&pdf.pages, options.min_cols);
    if raw_tables.is_empty()
        && let Some(text) = pdf.document_text.text().filter(|text| !text.trim().is_empty())
    {
        let whole = [PageText {
            page_number: 1,
            text: text.to_string(),
        }];
        let retried = detect_tables(&whole, options.min_cols);
        if !retried.is_empty() {
            warnings.push(ExtractWarning::new(
                WarningCode::DocumentTextRetry,
                "no page-level tables detected; retried with document-level text extraction",
            ));
            raw_tables = retried;
        }
    }

    let tables = apply_quality_mode(raw_tables, options.quality_mode, warnings)?;
    Ok(tables
        .into_iter()
        .map(|table| ExtractedContent::StructuredTable {
            page: table.page,
            rows: table.rows,
        })
        .collect())
}

fn page_contents(page: &PageText, min_cols: usize) -> Vec<(String, ExtractedContent)> {
    let tables = detect_page_tables(page, min_cols)
        .into_iter()
        .map(|table| {
            (
                PAGE_TABLE_NAME.to_string(),
                ExtractedContent::StructuredTable {
                    page: table.page,
                    rows: table.rows,
                },
            )
        })
        .collect::<Vec<_>>();
    if !tables.is_empty() {
        return tables;
    }

    let lines = text_lines(&page.text);
    if lines.is_empty() {
        debug!(page = page.page_number, "page has no extractable text");
        return Vec::new();
    }

    vec![(
        format!("Page_{}", page.page_number),
        ExtractedContent::TextLines {
            page: page.page_number,
            lines,
        },
    )]
}

fn page_fallback(pdf: &PdfText, options: &ExtractOptions) -> Vec<ExtractedTable> {
    let contents = pdf
        .pages
        .iter()
        .flat_map(|page| page_contents(page, options.min_cols))
        .collect::<Vec<_>>();

    let single = contents.len() == 1;
    contents
        .into_iter()
        .enumerate()
        .map(|(index, (name, content))| {
            let name = if single {
                name
            } else {
                format!("{name}_{}", index + 1)
            };
            content.into_table(truncate_chars(&name, MAX_SHEET_NAME_CHARS))
        })
        .collect()
}

/// Tries structured extraction first and falls back to per-page tables or
/// text lines. Fails with [`ConvertError::NoContent`] when both come back
/// empty.
pub fn extract_tables(pdf: &PdfText, options: &ExtractOptions) -> Result<Extraction, ConvertError> {
    options.validate()?;

    let mut warnings = Vec::new();
    if let DocumentText::Failed(detail) = &pdf.document_text {
        warn!(error = %detail, "layout text extraction failed; continuing with page text");
        warnings.push(ExtractWarning::new(
            WarningCode::StructuredExtractionFailed,
            format!("layout text extraction failed: {detail}"),
        ));
    }

    let structured = structured_pass(pdf, options, &mut warnings)?;
    if !structured.is_empty() {
        let count = structured.len();
        let tables = structured
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let name = if count == 1 {
                    SINGLE_TABLE_NAME.to_string()
                } else {
                    format!("Table_{}", index + 1)
                };
                content.into_table(name)
            })
            .collect::<Vec<_>>();
        info!(tables = tables.len(), "structured extraction succeeded");
        return Ok(Extraction {
            tables,
            path: ExtractionPath::Structured,
            warnings,
        });
    }

    warnings.push(ExtractWarning::new(
        WarningCode::FallbackToPageText,
        "structured extraction found no tables; falling back to per-page extraction",
    ));
    let tables = page_fallback(pdf, options);
    if tables.is_empty() {
        return Err(ConvertError::NoContent);
    }

    info!(tables = tables.len(), "page fallback extraction succeeded");
    Ok(Extraction {
        tables,
        path: ExtractionPath::PageFallback,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ExtractionPath, extract_tables, truncate_chars};
    use crate::error::ConvertError;
    use crate::model::{DocumentText, PageText, PdfText};
    use crate::options::{ExtractOptions, QualityMode};
    use crate::warning::WarningCode;

    fn pdf(pages: &[&str]) -> PdfText {
        PdfText {
            pages: pages
                .iter()
                .zip(1..)
                .map(|(text, page_number)| PageText {
                    page_number,
                    text: (*text).to_string(),
                })
                .collect(),
            document_text: DocumentText::Available(pages.join("\u{000C}")),
        }
    }

    #[test]
    fn single_structured_table_is_named_sheet1() {
        let extraction = extract_tables(
            &pdf(&["Name  Age  Score\nAlice  30  98\nBob  22  87\nCarol  41  75"]),
            &ExtractOptions::default(),
        )
        .expect("extraction should succeed");

        assert_eq!(extraction.path, ExtractionPath::Structured);
        assert_eq!(extraction.tables.len(), 1);
        let table = &extraction.tables[0];
        assert_eq!(table.name, "Sheet1");
        assert_eq!(
            table.header.as_deref(),
            Some(&["Name".to_string(), "Age".to_string(), "Score".to_string()][..])
        );
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.rows[2], vec!["Carol", "41", "75"]);
    }

    #[test]
    fn multiple_structured_tables_are_numbered() {
        let extraction = extract_tables(
            &pdf(&[
                "City  Pop\nA  10\nB  20",
                "Product  Qty\nPen  3\nBook  1",
            ]),
            &ExtractOptions::default(),
        )
        .expect("extraction should succeed");

        let names = extraction
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Table_1", "Table_2"]);
    }

    #[test]
    fn falls_back_to_text_lines_per_page() {
        let extraction = extract_tables(
            &pdf(&[
                "Dear reader,\nthis is narrative text.",
                "",
                "Closing remarks here.",
            ]),
            &ExtractOptions::default(),
        )
        .expect("fallback should succeed");

        assert_eq!(extraction.path, ExtractionPath::PageFallback);
        let names = extraction
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Page_1_1", "Page_3_2"]);
        assert_eq!(
            extraction.tables[0].rows,
            vec![vec!["Dear reader,"], vec!["this is narrative text."]]
        );
        assert!(
            extraction
                .warnings
                .iter()
                .any(|warning| warning.code == WarningCode::FallbackToPageText)
        );
    }

    #[test]
    fn single_fallback_result_keeps_bare_name() {
        let extraction = extract_tables(&pdf(&["Just one line of prose."]), &ExtractOptions::default())
            .expect("fallback should succeed");
        assert_eq!(extraction.tables.len(), 1);
        assert_eq!(extraction.tables[0].name, "Page_1");
        assert_eq!(
            extraction.tables[0].header,
            Some(vec!["Content".to_string()])
        );
    }

    #[test]
    fn fallback_prefers_relaxed_page_tables_over_text() {
        let extraction = extract_tables(&pdf(&["Item Qty\nPen 3\nBook 1"]), &ExtractOptions::default())
            .expect("fallback should succeed");
        assert_eq!(extraction.path, ExtractionPath::PageFallback);
        assert_eq!(extraction.tables[0].name, "Table");
        assert_eq!(
            extraction.tables[0].header,
            Some(vec!["Item".to_string(), "Qty".to_string()])
        );
    }

    #[test]
    fn empty_document_is_no_content() {
        let error = extract_tables(&pdf(&["", "   \n  "]), &ExtractOptions::default())
            .expect_err("blank pages must fail");
        assert!(matches!(error, ConvertError::NoContent));
        assert!(error.is_empty_content());
    }

    #[test]
    fn failed_layout_text_is_reported_not_swallowed() {
        let mut input = pdf(&["Name  Age\nAlice  30"]);
        input.document_text = DocumentText::Failed("unsupported filter".to_string());

        let extraction =
            extract_tables(&input, &ExtractOptions::default()).expect("page text still works");
        assert_eq!(extraction.path, ExtractionPath::Structured);
        let warning = extraction
            .warnings
            .iter()
            .find(|warning| warning.code == WarningCode::StructuredExtractionFailed)
            .expect("failure should be recorded");
        assert!(warning.message.contains("unsupported filter"));
    }

    #[test]
    fn strict_mode_rejects_ambiguous_tables() {
        let options = ExtractOptions {
            quality_mode: QualityMode::Strict,
            ..ExtractOptions::default()
        };
        let error = extract_tables(&pdf(&["A  B  C\n1  2\n3  4  5  6\n7  8"]), &options)
            .expect_err("ambiguous table must fail in strict mode");
        assert!(matches!(error, ConvertError::AmbiguousTable { page: 1, .. }));
    }

    #[test]
    fn fallback_names_are_capped() {
        let long = "x".repeat(40);
        assert_eq!(truncate_chars(&long, 31).chars().count(), 31);
        assert_eq!(truncate_chars("Page_12", 31), "Page_12");
    }
}
