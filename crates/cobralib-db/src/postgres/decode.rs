use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

use cobralib_core::{QueryResult, Value};

pub(crate) fn rows_to_result(rows: &[PgRow]) -> QueryResult {
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

/// Decode one cell by its PostgreSQL type name.
pub(crate) fn decode_value(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_ascii_uppercase();
    match type_name.as_str() {
        "BOOL" => get(row, idx, Value::Bool),
        "INT2" | "SMALLINT" => get(row, idx, Value::Int16),
        "INT4" | "INT" | "INTEGER" => get(row, idx, Value::Int32),
        "INT8" | "BIGINT" => get(row, idx, Value::Int64),
        "OID" => get(row, idx, |v: sqlx::postgres::types::Oid| {
            Value::Int64(v.0.into())
        }),
        "FLOAT4" | "REAL" => get(row, idx, Value::Float32),
        "FLOAT8" | "DOUBLE PRECISION" => get(row, idx, Value::Float64),
        "NUMERIC" | "DECIMAL" | "MONEY" => get(row, idx, |v: Decimal| Value::Decimal(v)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => get(row, idx, Value::Text),
        "BYTEA" => get(row, idx, Value::Bytes),
        "DATE" => get(row, idx, |v: NaiveDate| Value::Date(v)),
        "TIME" => get(row, idx, |v: NaiveTime| Value::Time(v)),
        "TIMESTAMP" => get(row, idx, |v: NaiveDateTime| Value::DateTime(v)),
        "TIMESTAMPTZ" => get(row, idx, |v: DateTime<Utc>| Value::DateTime(v.naive_utc())),
        "UUID" => get(row, idx, Value::Uuid),
        "JSON" | "JSONB" => get(row, idx, |v: serde_json::Value| Value::Json(v)),
        _ => fallback(row, idx),
    }
}

fn get<T, F>(row: &PgRow, idx: usize, wrap: F) -> Value
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => Value::Null,
        Err(_) => fallback(row, idx),
    }
}

fn fallback(row: &PgRow, idx: usize) -> Value {
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
