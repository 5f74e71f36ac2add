use cobralib_core::{Error, Result};

/// Header row plus string records, the common product of every source
/// reader. Records are padded or truncated to the header width by the
/// readers, so consumers can index by header position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Index of a named header, or an ingest error naming the header.
    pub fn column_index(&self, header: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| {
                Error::Ingest(format!(
                    "source has no column named '{header}' (available: {})",
                    self.headers.join(", ")
                ))
            })
    }
}

/// Pad or truncate a record to the header width.
pub(crate) fn normalize_record(mut record: Vec<String>, width: usize) -> Vec<String> {
    record.resize(width, String::new());
    record
}
