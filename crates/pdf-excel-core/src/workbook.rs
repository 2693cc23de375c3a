use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::ConvertError;
use crate::extract::{MAX_SHEET_NAME_CHARS, truncate_chars};
use crate::model::ExtractedTable;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned = name
        .chars()
        .filter(|ch| !FORBIDDEN_SHEET_CHARS.contains(ch))
        .collect::<String>();
    let cleaned = cleaned.trim().trim_matches('\'');
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        truncate_chars(cleaned, MAX_SHEET_NAME_CHARS)
    }
}

/// Worksheet names for `tables`, in order. Every name is at most 31
/// characters and unique within the workbook ignoring case.
#[must_use]
pub fn sheet_names(tables: &[ExtractedTable]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(tables.len());

    for (index, table) in tables.iter().enumerate() {
        let base = sanitize_sheet_name(&table.name);
        let mut candidate = base.clone();
        let mut suffix = index + 1;
        while !taken.insert(candidate.to_lowercase()) {
            let tail = format!("_{suffix}");
            let stem = truncate_chars(&base, MAX_SHEET_NAME_CHARS - tail.chars().count());
            candidate = format!("{stem}{tail}");
            suffix += 1;
        }
        names.push(candidate);
    }

    names
}

/// Plain decimal numbers are written as numeric cells. Values with a leading
/// zero (codes, zip numbers) stay text.
fn numeric_value(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let digits = trimmed.trim_start_matches('-');
    if digits.is_empty()
        || !digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
        || (digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0."))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn write_table(
    sheet: &mut Worksheet,
    table: &ExtractedTable,
    header_format: &Format,
) -> Result<(), ConvertError> {
    let mut row_index = 0_u32;
    if let Some(header) = &table.header {
        for (col, value) in (0_u16..).zip(header) {
            sheet.write_string_with_format(row_index, col, value, header_format)?;
        }
        row_index += 1;
    }

    for row in &table.rows {
        for (col, value) in (0_u16..).zip(row) {
            if value.is_empty() {
                continue;
            }
            match numeric_value(value) {
                Some(number) => sheet.write_number(row_index, col, number)?,
                None => sheet.write_string(row_index, col, value)?,
            };
        }
        row_index += 1;
    }

    Ok(())
}

fn build_workbook(tables: &[ExtractedTable]) -> Result<Workbook, ConvertError> {
    if tables.is_empty() {
        return Err(ConvertError::EmptyWorkbook);
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    for (table, name) in tables.iter().zip(sheet_names(tables)) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_table(sheet, table, &header_format)?;
    }

    Ok(workbook)
}

/// Writes one worksheet per table, in order, without an index column.
pub fn write_workbook(path: &Path, tables: &[ExtractedTable]) -> Result<(), ConvertError> {
    let mut workbook = build_workbook(tables)?;
    workbook.save(path)?;
    Ok(())
}

pub fn workbook_to_bytes(tables: &[ExtractedTable]) -> Result<Vec<u8>, ConvertError> {
    let mut workbook = build_workbook(tables)?;
    Ok(workbook.save_to_buffer()?)
}
