//! Bulk loading from file sources into existing tables.
//!
//! Every source is first read into a [`TextTable`] of strings; the column
//! mapping then names which source columns feed which target columns and
//! how each string is coerced. Rows are inserted one at a time through the
//! adapter, so partially loaded data is visible if a row fails.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use cobralib_core::{sanitize_identifier, Error, Result, Value};
use cobralib_ingest::{read_delimited, read_pdf_table, read_sheet, DelimitedOptions, TextTable};

use crate::adapter::Relational;

/// How a source string becomes a bound parameter. Empty and
/// whitespace-only fields always become NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    Text,
    Int,
    BigInt,
    Float,
    Bool,
    Decimal,
    /// `YYYY-MM-DD`.
    Date,
}

impl Coerce {
    fn apply(&self, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            Coerce::Text => Ok(Value::Text(raw.to_string())),
            Coerce::Int => raw
                .parse::<i32>()
                .map(Value::Int32)
                .map_err(|_| bad_field(raw, "an integer")),
            Coerce::BigInt => raw
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|_| bad_field(raw, "an integer")),
            Coerce::Float => raw
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| bad_field(raw, "a number")),
            Coerce::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(bad_field(raw, "a boolean")),
            },
            Coerce::Decimal => raw
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|_| bad_field(raw, "a decimal")),
            Coerce::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| bad_field(raw, "a YYYY-MM-DD date")),
        }
    }
}

fn bad_field(raw: &str, expected: &str) -> Error {
    Error::Ingest(format!("field '{raw}' is not {expected}"))
}

/// One source-column-to-table-column mapping.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Header in the source file.
    pub source: String,
    /// Column in the target table.
    pub target: String,
    pub coerce: Coerce,
}

impl ColumnMap {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            coerce: Coerce::Text,
        }
    }

    /// Mapping where the source header and table column share a name.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    pub fn with_coerce(mut self, coerce: Coerce) -> Self {
        self.coerce = coerce;
        self
    }
}

/// Insert every record of `source` into `table`.
///
/// Returns the number of rows inserted. Target column names are sanitized
/// the same way for every engine, so headers with spaces or punctuation
/// land in predictable columns.
pub async fn load_rows(
    db: &mut dyn Relational,
    table: &str,
    source: &TextTable,
    columns: &[ColumnMap],
) -> Result<u64> {
    if columns.is_empty() {
        return Err(Error::Ingest(
            "at least one column mapping is required".to_string(),
        ));
    }
    let indices = columns
        .iter()
        .map(|map| source.column_index(&map.source))
        .collect::<Result<Vec<_>>>()?;
    let targets: Vec<String> = columns
        .iter()
        .map(|map| sanitize_identifier(&map.target))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        targets.join(", ")
    );

    let mut total = 0u64;
    for record in &source.records {
        let params = columns
            .iter()
            .zip(&indices)
            .map(|(map, &idx)| map.coerce.apply(&record[idx]))
            .collect::<Result<Vec<_>>>()?;
        let result = db.execute(&sql, &params).await?;
        total += result.rows_affected;
    }
    debug!(table, rows = total, "bulk load complete");
    Ok(total)
}

/// Load a delimited text file into `table`.
pub async fn load_delimited(
    db: &mut dyn Relational,
    table: &str,
    path: impl AsRef<Path>,
    columns: &[ColumnMap],
    opts: &DelimitedOptions,
) -> Result<u64> {
    let source = read_delimited(path, opts)?;
    load_rows(db, table, &source, columns).await
}

/// Load one sheet of an Excel workbook into `table`.
pub async fn load_excel(
    db: &mut dyn Relational,
    table: &str,
    path: impl AsRef<Path>,
    sheet: &str,
    skip_rows: usize,
    columns: &[ColumnMap],
) -> Result<u64> {
    let source = read_sheet(path, sheet, skip_rows)?;
    load_rows(db, table, &source, columns).await
}

/// Load a table detected on a PDF page into `table`.
pub async fn load_pdf(
    db: &mut dyn Relational,
    table: &str,
    path: impl AsRef<Path>,
    page: u32,
    table_index: usize,
    columns: &[ColumnMap],
) -> Result<u64> {
    let source = read_pdf_table(path, page, table_index)?;
    load_rows(db, table, &source, columns).await
}
