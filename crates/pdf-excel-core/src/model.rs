use crate::table_parse::normalize_rows;

pub const CONTENT_COLUMN: &str = "Content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Whole-document layout text, kept separately so a crashing layout pass is
/// visible to callers instead of silently looking like an empty document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentText {
    Available(String),
    Failed(String),
}

impl DocumentText {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Available(text) => Some(text),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub pages: Vec<PageText>,
    pub document_text: DocumentText,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

/// Raw extraction result before it is shaped into a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    StructuredTable { page: u32, rows: Vec<Vec<String>> },
    TextLines { page: u32, lines: Vec<String> },
}

impl ExtractedContent {
    #[must_use]
    pub fn page(&self) -> u32 {
        match self {
            Self::StructuredTable { page, .. } | Self::TextLines { page, .. } => *page,
        }
    }

    /// Normalizes either variant into the single table shape the writer
    /// consumes. Structured rows are padded to the widest row and the first
    /// row becomes the header.
    #[must_use]
    pub fn into_table(self, name: impl Into<String>) -> ExtractedTable {
        let name = name.into();
        match self {
            Self::StructuredTable { rows, .. } => {
                let width = rows.iter().map(Vec::len).max().unwrap_or(0);
                let mut rows = normalize_rows(&rows, width).into_iter();
                let header = rows.next();
                ExtractedTable {
                    name,
                    header,
                    rows: rows.collect(),
                }
            }
            Self::TextLines { lines, .. } => ExtractedTable {
                name,
                header: Some(vec![CONTENT_COLUMN.to_string()]),
                rows: lines.into_iter().map(|line| vec![line]).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub name: String,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// Number of spreadsheet rows this table occupies, header included.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.header.is_some())
    }
}

/// First-sheet contents of an uploaded spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularData {
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.columns.len()))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedReport {
    pub page_count: usize,
    pub row_count: usize,
}
