use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use tracing::debug;

use crate::error::ConvertError;
use crate::model::TabularData;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        }
        other => other.to_string(),
    }
}

fn first_sheet<RS>(mut workbook: Sheets<RS>) -> Result<TabularData, ConvertError>
where
    RS: Read + Seek,
{
    let sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ConvertError::NoWorksheets)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let columns = rows.next().unwrap_or_default();
    let width = columns.len();
    let rows = rows
        .map(|mut row| {
            if row.len() < width {
                row.resize(width, String::new());
            }
            row
        })
        .collect::<Vec<_>>();

    debug!(
        sheet = sheet_name.as_deref().unwrap_or_default(),
        columns = width,
        rows = rows.len(),
        "loaded first worksheet"
    );
    Ok(TabularData { columns, rows })
}

/// Loads the first worksheet; the first row becomes the column names and
/// every other sheet is ignored.
pub fn read_first_sheet(path: &Path) -> Result<TabularData, ConvertError> {
    let workbook = open_workbook_auto(path)?;
    first_sheet(workbook)
}

#[cfg(test)]
mod tests {
    use calamine::Data;

    use super::cell_text;

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }
}
