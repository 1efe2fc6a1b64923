use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::AdapterError;
use crate::types::RowValues;

/// A destination a row column can be copied into.
///
/// `Row::scan` takes a slice of these, one per selected column, in column order:
/// ```rust
/// use queue_adapter::prelude::*;
///
/// let mut id = 0_i64;
/// let mut queue = String::new();
/// let mut last_error: Option<String> = None;
/// scan_into(
///     vec![RowValues::Int(7), RowValues::Text("default".into()), RowValues::Null],
///     &mut [&mut id, &mut queue, &mut last_error],
/// )?;
/// assert_eq!((id, queue.as_str(), last_error), (7, "default", None));
/// # Ok::<(), AdapterError>(())
/// ```
pub trait ScanTarget: Send {
    /// Store `value` into `self`.
    ///
    /// # Errors
    /// Returns `AdapterError::ScanError` when the value cannot be represented by the target type.
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError>;
}

/// Copy one row's values into `dest`, position by position.
///
/// # Errors
/// Returns `AdapterError::ScanError` on a column/destination count mismatch or when a column
/// cannot be stored into its destination.
pub fn scan_into(
    values: Vec<RowValues>,
    dest: &mut [&mut dyn ScanTarget],
) -> Result<(), AdapterError> {
    if values.len() != dest.len() {
        return Err(AdapterError::ScanError(format!(
            "number of field descriptions must equal number of destinations, got {} and {}",
            values.len(),
            dest.len()
        )));
    }
    for (idx, (value, target)) in values.into_iter().zip(dest.iter_mut()).enumerate() {
        target
            .scan_value(value)
            .map_err(|e| AdapterError::ScanError(format!("column {idx}: {e}")))?;
    }
    Ok(())
}

fn mismatch(value: &RowValues, target: &str) -> AdapterError {
    AdapterError::ScanError(format!("cannot scan {} into {target}", value.kind()))
}

impl ScanTarget for RowValues {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = value;
        Ok(())
    }
}

impl ScanTarget for i64 {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = *value.as_int().ok_or_else(|| mismatch(&value, "i64"))?;
        Ok(())
    }
}

impl ScanTarget for i32 {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        let wide = *value.as_int().ok_or_else(|| mismatch(&value, "i32"))?;
        *self = i32::try_from(wide).map_err(|e| AdapterError::ScanError(e.to_string()))?;
        Ok(())
    }
}

impl ScanTarget for i16 {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        let wide = *value.as_int().ok_or_else(|| mismatch(&value, "i16"))?;
        *self = i16::try_from(wide).map_err(|e| AdapterError::ScanError(e.to_string()))?;
        Ok(())
    }
}

impl ScanTarget for f64 {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = value.as_float().ok_or_else(|| mismatch(&value, "f64"))?;
        Ok(())
    }
}

impl ScanTarget for bool {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = value.as_bool().ok_or_else(|| mismatch(&value, "bool"))?;
        Ok(())
    }
}

impl ScanTarget for String {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        match value {
            RowValues::Text(s) => *self = s,
            other => return Err(mismatch(&other, "String")),
        }
        Ok(())
    }
}

impl ScanTarget for Vec<u8> {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        match value {
            RowValues::Blob(bytes) => *self = bytes,
            RowValues::Text(s) => *self = s.into_bytes(),
            other => return Err(mismatch(&other, "Vec<u8>")),
        }
        Ok(())
    }
}

impl ScanTarget for NaiveDateTime {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = value
            .as_timestamp()
            .ok_or_else(|| mismatch(&value, "NaiveDateTime"))?;
        Ok(())
    }
}

impl ScanTarget for DateTime<Utc> {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = value
            .as_timestamp()
            .ok_or_else(|| mismatch(&value, "DateTime<Utc>"))?
            .and_utc();
        Ok(())
    }
}

impl ScanTarget for JsonValue {
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        *self = match value {
            RowValues::JSON(json) => json,
            // SQLite keeps JSON as text
            RowValues::Text(s) => serde_json::from_str(&s)
                .map_err(|e| AdapterError::ScanError(format!("invalid json: {e}")))?,
            RowValues::Blob(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AdapterError::ScanError(format!("invalid json: {e}")))?,
            RowValues::Null => JsonValue::Null,
            other => return Err(mismatch(&other, "serde_json::Value")),
        };
        Ok(())
    }
}

impl<T> ScanTarget for Option<T>
where
    T: ScanTarget + Default,
{
    fn scan_value(&mut self, value: RowValues) -> Result<(), AdapterError> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.scan_value(value)?;
        *self = Some(inner);
        Ok(())
    }
}
