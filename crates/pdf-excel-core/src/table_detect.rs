use crate::model::{DetectedTable, PageText};
use crate::table_parse::{modal_width, split_cells, split_tokens};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// A header plus at least one data row. Shorter blocks are never reported,
/// so callers see no empty tables.
const MIN_TABLE_ROWS: usize = 2;

#[allow(clippy::cast_precision_loss)]
fn table_confidence(rows: &[Vec<String>]) -> f32 {
    if rows.len() < MIN_TABLE_ROWS {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = if max_width == 0 {
        0.0
    } else {
        1.0 - ((max_width - min_width) as f32 / max_width as f32)
    };

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Splitting {
    /// Only tab or wide-gap separated cells count.
    Columns,
    /// Short single-space separated lines may also form rows.
    Relaxed,
}

fn row_cells(line: &str, min_cols: usize, splitting: Splitting) -> Vec<String> {
    let cells = split_cells(line);
    if cells.len() >= min_cols || splitting == Splitting::Columns {
        return cells;
    }

    let tokens = split_tokens(line);
    let has_numeric = tokens
        .iter()
        .any(|token| token.chars().any(|ch| ch.is_ascii_digit()));
    let looks_like_sentence = ['.', '!', '?']
        .iter()
        .any(|punctuation| line.trim_end().ends_with(*punctuation));
    if tokens.len() >= min_cols && !looks_like_sentence && (has_numeric || tokens.len() <= 6) {
        tokens
    } else {
        cells
    }
}

fn detect_in_page(page: &PageText, min_cols: usize, splitting: Splitting) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush_current = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>| {
        if rows.len() >= MIN_TABLE_ROWS {
            let confidence = table_confidence(rows);
            tables.push(DetectedTable {
                page: page.page_number,
                rows: std::mem::take(rows),
                confidence,
            });
        } else {
            rows.clear();
        }
    };

    for line in page.text.lines() {
        let cells = row_cells(line, min_cols, splitting);
        if cells.len() >= min_cols {
            current_rows.push(cells);
        } else {
            flush_current(&mut current_rows, &mut tables);
        }
    }

    flush_current(&mut current_rows, &mut tables);
    tables
}

/// Document-wide pass: column-aligned regions on every page.
pub(crate) fn detect_tables(pages: &[PageText], min_cols: usize) -> Vec<DetectedTable> {
    pages
        .iter()
        .flat_map(|page| detect_in_page(page, min_cols.max(2), Splitting::Columns))
        .collect()
}

/// Per-page pass used once the document-wide pass came back empty.
pub(crate) fn detect_page_tables(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    detect_in_page(page, min_cols.max(2), Splitting::Relaxed)
}
