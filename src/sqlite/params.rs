use rusqlite::types::Value;

use crate::error::AdapterError;
use crate::translation::align_args;
use crate::types::{ParamConverter, RowValues};

/// Convert a single `RowValue` to a rusqlite `Value`.
///
/// `SQLite` has no boolean, timestamp or JSON storage class: booleans become 0/1 and timestamps
/// and JSON are stored as text.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// `SQLite` parameters, laid out so that slot `i` binds `?i`.
///
/// Slot 0 is never bound.
#[derive(Debug, Clone)]
pub struct Params(Vec<Value>);

impl Params {
    /// Convert canonical 1-indexed arguments into `SQLite` values.
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Params(align_args(params).iter().map(row_value_to_sqlite_value).collect())
    }

    /// Number of arguments supplied, not counting slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind every argument to its `?N` parameter.
    ///
    /// # Errors
    /// Returns `rusqlite::Error::InvalidParameterCount` when the statement expects a different
    /// number of arguments, or the binding error.
    pub fn bind(&self, stmt: &mut rusqlite::Statement<'_>) -> Result<(), rusqlite::Error> {
        let expected = stmt.parameter_count();
        if expected != self.len() {
            return Err(rusqlite::Error::InvalidParameterCount(self.len(), expected));
        }
        for (idx, value) in self.0.iter().enumerate().skip(1) {
            stmt.raw_bind_parameter(idx, value)?;
        }
        Ok(())
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, AdapterError> {
        Ok(Self::convert(params))
    }
}
