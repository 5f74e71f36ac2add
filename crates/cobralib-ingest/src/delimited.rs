use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cobralib_core::{Error, Result};
use tracing::debug;

use crate::table::{normalize_record, TextTable};

/// Field delimiter for text sources.
///
/// `Whitespace` treats any run of spaces or tabs as one separator, for
/// fixed-width or irregularly spaced files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Byte(u8),
    Whitespace,
}

/// Options for [`read_delimited`].
#[derive(Debug, Clone)]
pub struct DelimitedOptions {
    pub delimiter: Delimiter,
    /// Metadata rows to discard before the header row.
    pub skip_rows: usize,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Byte(b','),
            skip_rows: 0,
        }
    }
}

/// Read a delimited text file into a [`TextTable`].
///
/// The first row after `skip_rows` is the header; every following record
/// is normalized to the header width.
pub fn read_delimited(path: impl AsRef<Path>, opts: &DelimitedOptions) -> Result<TextTable> {
    let path = path.as_ref();
    let table = match opts.delimiter {
        Delimiter::Byte(byte) => read_with_csv(path, byte, opts.skip_rows)?,
        Delimiter::Whitespace => read_whitespace(path, opts.skip_rows)?,
    };
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "read delimited source"
    );
    Ok(table)
}

fn read_with_csv(path: &Path, delimiter: u8, skip_rows: usize) -> Result<TextTable> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = reader.records();
    for _ in 0..skip_rows {
        match rows.next() {
            Some(record) => {
                record.map_err(|err| Error::Ingest(format!("reading {}: {err}", path.display())))?;
            }
            None => return Err(Error::Ingest(format!("{}: no header row", path.display()))),
        }
    }

    let headers = match rows.next() {
        Some(record) => record
            .map_err(|err| Error::Ingest(format!("reading {}: {err}", path.display())))?
            .iter()
            .map(|field| field.trim().to_string())
            .collect::<Vec<_>>(),
        None => return Err(Error::Ingest(format!("{}: no header row", path.display()))),
    };

    let mut records = Vec::new();
    for record in rows {
        let record =
            record.map_err(|err| Error::Ingest(format!("reading {}: {err}", path.display())))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let fields = record.iter().map(|field| field.trim().to_string()).collect();
        records.push(normalize_record(fields, headers.len()));
    }

    Ok(TextTable::new(headers, records))
}

fn read_whitespace(path: &Path, skip_rows: usize) -> Result<TextTable> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .skip(skip_rows)
        .filter(|line| !line.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(line) => line.split_whitespace().map(str::to_string).collect(),
        None => return Err(Error::Ingest(format!("{}: no header row", path.display()))),
    };

    let records = lines
        .map(|line| {
            let fields = line.split_whitespace().map(str::to_string).collect();
            normalize_record(fields, headers.len())
        })
        .collect();

    Ok(TextTable::new(headers, records))
}
