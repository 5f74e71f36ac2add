use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tiberius::{ColumnType, Row};
use uuid::Uuid;

use cobralib_core::{QueryResult, Value};

pub(crate) fn rows_to_result(rows: &[Row]) -> QueryResult {
    let Some(first) = rows.first() else {
        return QueryResult::tabular(Vec::new(), Vec::new());
    };
    let columns: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let data = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|idx| decode_value(row, idx, row.columns()[idx].column_type()))
                .collect()
        })
        .collect();
    QueryResult::tabular(columns, data)
}

/// Decode one cell by its TDS column type.
///
/// The nullable wire types (`Intn`, `Floatn`, …) carry a per-value width,
/// so those arms try the candidate widths in turn.
pub(crate) fn decode_value(row: &Row, idx: usize, ty: ColumnType) -> Value {
    match ty {
        ColumnType::Null => Value::Null,
        ColumnType::Bit | ColumnType::Bitn => get(row, idx, Value::Bool),
        ColumnType::Int1 => get(row, idx, |v: u8| Value::Int16(v.into())),
        ColumnType::Int2 => get(row, idx, Value::Int16),
        ColumnType::Int4 => get(row, idx, Value::Int32),
        ColumnType::Int8 => get(row, idx, Value::Int64),
        ColumnType::Intn => {
            if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
                Value::Int32(v)
            } else if let Ok(Some(v)) = row.try_get::<i64, _>(idx) {
                Value::Int64(v)
            } else if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
                Value::Int16(v)
            } else if let Ok(Some(v)) = row.try_get::<u8, _>(idx) {
                Value::Int16(v.into())
            } else {
                Value::Null
            }
        }
        ColumnType::Float4 => get(row, idx, Value::Float32),
        ColumnType::Float8 => get(row, idx, Value::Float64),
        ColumnType::Floatn => {
            if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
                Value::Float64(v)
            } else if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
                Value::Float32(v)
            } else {
                Value::Null
            }
        }
        ColumnType::Decimaln | ColumnType::Numericn | ColumnType::Money | ColumnType::Money4 => {
            get(row, idx, |v: Decimal| Value::Decimal(v))
        }
        ColumnType::Guid => get(row, idx, |v: Uuid| Value::Uuid(v)),
        ColumnType::Daten => get(row, idx, |v: NaiveDate| Value::Date(v)),
        ColumnType::Timen => get(row, idx, |v: NaiveTime| Value::Time(v)),
        ColumnType::Datetime
        | ColumnType::Datetime4
        | ColumnType::Datetimen
        | ColumnType::Datetime2 => get(row, idx, |v: NaiveDateTime| Value::DateTime(v)),
        ColumnType::DatetimeOffsetn => {
            get(row, idx, |v: DateTime<Utc>| Value::DateTime(v.naive_utc()))
        }
        ColumnType::BigBinary | ColumnType::BigVarBin | ColumnType::Image => {
            get(row, idx, |v: &[u8]| Value::Bytes(v.to_vec()))
        }
        _ => get(row, idx, |v: &str| Value::Text(v.to_string())),
    }
}

fn get<'a, T, F>(row: &'a Row, idx: usize, wrap: F) -> Value
where
    T: tiberius::FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<T, _>(idx) {
        Ok(Some(v)) => wrap(v),
        _ => Value::Null,
    }
}
