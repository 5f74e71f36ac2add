use std::path::Path;

use cobralib_core::{Error, Result};
use lopdf::Document;
use tracing::debug;

use crate::table::{normalize_record, TextTable};

/// Read a table out of a PDF page into a [`TextTable`].
///
/// `page` is the 1-based page number, `table_index` the 0-based index of
/// the table within that page. A table is a contiguous run of at least two
/// text lines that each split into two or more whitespace-separated
/// fields; the first line of the run is the header.
pub fn read_pdf_table(path: impl AsRef<Path>, page: u32, table_index: usize) -> Result<TextTable> {
    let path = path.as_ref();
    let doc = Document::load(path)
        .map_err(|err| Error::Ingest(format!("opening {}: {err}", path.display())))?;

    if !doc.get_pages().contains_key(&page) {
        return Err(Error::Ingest(format!(
            "{} has no page {page}",
            path.display()
        )));
    }

    let text = doc
        .extract_text(&[page])
        .map_err(|err| Error::Ingest(format!("extracting page {page}: {err}")))?;

    let tables = detect_tables(&text);
    debug!(
        path = %path.display(),
        page,
        tables = tables.len(),
        "scanned pdf page"
    );

    let lines = tables.into_iter().nth(table_index).ok_or_else(|| {
        Error::Ingest(format!(
            "page {page} of {} has no table at index {table_index}",
            path.display()
        ))
    })?;

    let headers: Vec<String> = split_fields(&lines[0]);
    let records = lines[1..]
        .iter()
        .map(|line| normalize_record(split_fields(line), headers.len()))
        .collect();

    Ok(TextTable::new(headers, records))
}

fn split_fields(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Group the page text into candidate tables.
///
/// Lines with fewer than two fields (titles, prose fragments, blanks)
/// terminate the current run; runs shorter than two lines are discarded
/// because a table needs a header and at least one row.
fn detect_tables(text: &str) -> Vec<Vec<String>> {
    let mut tables = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.split_whitespace().count() >= 2 {
            current.push(trimmed.to_string());
        } else {
            if current.len() >= 2 {
                tables.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() >= 2 {
        tables.push(current);
    }

    tables
}
