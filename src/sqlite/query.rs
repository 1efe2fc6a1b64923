use rusqlite::types::Value;

use crate::error::AdapterError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// Values come back by storage class; timestamps and JSON arrive as `Text` and are read through
/// the matching scan targets.
///
/// # Errors
///
/// Returns `AdapterError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, AdapterError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Extract the first `column_count` columns of `row`.
///
/// # Errors
///
/// Returns `AdapterError` if any column cannot be read.
pub fn extract_row(
    row: &rusqlite::Row,
    column_count: usize,
) -> Result<Vec<RowValues>, AdapterError> {
    let mut values = Vec::with_capacity(column_count);
    for idx in 0..column_count {
        values.push(sqlite_extract_value_sync(row, idx)?);
    }
    Ok(values)
}
