use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use cobralib_core::{Error, Result};
use tracing::debug;

use crate::table::{normalize_record, TextTable};

/// Read one sheet of an Excel workbook into a [`TextTable`].
///
/// The first row after `skip_rows` is the header. Cells are rendered to
/// text; numeric cells holding whole numbers render without the trailing
/// `.0` Excel storage would otherwise produce.
pub fn read_sheet(path: impl AsRef<Path>, sheet: &str, skip_rows: usize) -> Result<TextTable> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| Error::Ingest(format!("opening {}: {err}", path.display())))?;

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|err| Error::Ingest(format!("sheet '{sheet}' in {}: {err}", path.display())))?;

    let mut rows = range.rows().skip(skip_rows);

    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(render_cell).collect(),
        None => {
            return Err(Error::Ingest(format!(
                "sheet '{sheet}' in {}: no header row",
                path.display()
            )))
        }
    };

    let mut records = Vec::new();
    for row in rows {
        let fields: Vec<String> = row.iter().map(render_cell).collect();
        if fields.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(normalize_record(fields, headers.len()));
    }

    debug!(
        path = %path.display(),
        sheet,
        rows = records.len(),
        "read excel sheet"
    );
    Ok(TextTable::new(headers, records))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(err) => format!("#ERR:{err:?}"),
    }
}
