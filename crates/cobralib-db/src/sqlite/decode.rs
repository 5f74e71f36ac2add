use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo};

use cobralib_core::{QueryResult, Value};

pub(crate) fn rows_to_result(rows: &[SqliteRow]) -> QueryResult {
    let Some(first) = rows.first() else {
        return QueryResult::tabular(Vec::new(), Vec::new());
    };
    let columns = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let data = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|idx| decode_value(row, idx))
                .collect()
        })
        .collect();
    QueryResult::tabular(columns, data)
}

/// Decode one cell by its SQLite affinity name.
///
/// Expressions without a declared type fall through to the try-chain,
/// which mirrors SQLite's own storage classes.
pub(crate) fn decode_value(row: &SqliteRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_ascii_uppercase();
    match type_name.as_str() {
        "NULL" => Value::Null,
        "BOOLEAN" => get(row, idx, Value::Bool),
        "INTEGER" | "INT" | "BIGINT" => get(row, idx, Value::Int64),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => get(row, idx, Value::Float64),
        "TEXT" | "VARCHAR" | "CHAR" | "CLOB" => get(row, idx, Value::Text),
        "BLOB" => get(row, idx, Value::Bytes),
        "DATE" => get(row, idx, |v: NaiveDate| Value::Date(v)),
        "TIME" => get(row, idx, |v: NaiveTime| Value::Time(v)),
        "DATETIME" | "TIMESTAMP" => get(row, idx, |v: NaiveDateTime| Value::DateTime(v)),
        _ => fallback(row, idx),
    }
}

fn get<T, F>(row: &SqliteRow, idx: usize, wrap: F) -> Value
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => Value::Null,
        Err(_) => fallback(row, idx),
    }
}

fn fallback(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Int64(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return Value::Float64(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return Value::Text(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Value::Bytes(v);
    }
    Value::Null
}
