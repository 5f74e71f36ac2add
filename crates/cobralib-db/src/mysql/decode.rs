use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};

use cobralib_core::{QueryResult, Value};

pub(crate) fn rows_to_result(rows: &[MySqlRow]) -> QueryResult {
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

/// Decode one cell by its MySQL type name.
pub(crate) fn decode_value(row: &MySqlRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_ascii_uppercase();
    match type_name.as_str() {
        "BOOLEAN" | "BOOL" => get(row, idx, Value::Bool),
        "TINYINT" | "SMALLINT" => get(row, idx, Value::Int16),
        "MEDIUMINT" | "INT" | "INTEGER" => get(row, idx, Value::Int32),
        "BIGINT" => get(row, idx, Value::Int64),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" => get(row, idx, |v: u16| Value::Int32(v.into())),
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => get(row, idx, |v: u32| Value::Int64(v.into())),
        "BIGINT UNSIGNED" => get(row, idx, |v: u64| Value::Int64(v as i64)),
        "YEAR" => get(row, idx, |v: u16| Value::Int32(v.into())),
        "FLOAT" => get(row, idx, Value::Float32),
        "DOUBLE" => get(row, idx, Value::Float64),
        "DECIMAL" | "NUMERIC" => get(row, idx, |v: Decimal| Value::Decimal(v)),
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            get(row, idx, Value::Text)
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
            get(row, idx, Value::Bytes)
        }
        "DATE" => get(row, idx, |v: NaiveDate| Value::Date(v)),
        "TIME" => get(row, idx, |v: NaiveTime| Value::Time(v)),
        "DATETIME" | "TIMESTAMP" => get(row, idx, |v: NaiveDateTime| Value::DateTime(v)),
        "JSON" => get(row, idx, |v: serde_json::Value| Value::Json(v)),
        _ => fallback(row, idx),
    }
}

fn get<T, F>(row: &MySqlRow, idx: usize, wrap: F) -> Value
where
    T: for<'r> sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => Value::Null,
        Err(_) => fallback(row, idx),
    }
}

fn fallback(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return Value::Text(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Int64(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return Value::Float64(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Value::Bytes(v);
    }
    Value::Null
}
