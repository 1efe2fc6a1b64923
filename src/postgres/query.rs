use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deadpool_postgres::ClientWrapper;
use serde_json::Value;
use tracing::debug;

use crate::error::AdapterError;
use crate::results::CommandTag;
use crate::translation::{PlaceholderStyle, translate_placeholders};
use crate::types::{ParamConverter, RowValues};

use super::params::Params as PgParams;

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `AdapterError` if the column cannot be retrieved.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, AdapterError> {
    let type_info = row.columns()[idx].type_();

    let value = match type_info.name() {
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(RowValues::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| RowValues::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(RowValues::Float),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(RowValues::Bool),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(RowValues::Timestamp),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| RowValues::Timestamp(v.naive_utc())),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|v| RowValues::Timestamp(v.and_time(NaiveTime::MIN))),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx)?.map(RowValues::JSON),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(RowValues::Blob),
        // text, varchar, bpchar, name and anything else with a textual FromSql
        _ => row.try_get::<_, Option<String>>(idx)?.map(RowValues::Text),
    };

    Ok(value.unwrap_or(RowValues::Null))
}

/// Extract every column of `row`, in select-list order.
///
/// # Errors
/// Returns `AdapterError` if any column cannot be retrieved.
pub fn extract_row(row: &tokio_postgres::Row) -> Result<Vec<RowValues>, AdapterError> {
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        values.push(postgres_extract_value(row, idx)?);
    }
    Ok(values)
}

/// Execute a statement on a pooled client and report the rows it affected.
///
/// Statements go through the client's prepared-statement cache.
///
/// # Errors
/// Returns errors from parameter conversion, preparation, or execution.
pub async fn execute_on(
    client: &ClientWrapper,
    sql: &str,
    args: &[RowValues],
) -> Result<CommandTag, AdapterError> {
    let sql = translate_placeholders(sql, PlaceholderStyle::Postgres);
    let converted = PgParams::convert_sql_params(args)?;
    let stmt = client.prepare_cached(&sql).await?;
    let affected = client.execute(&stmt, converted.as_refs()).await?;
    debug!(rows_affected = affected, "postgres execute");
    Ok(CommandTag::from(affected))
}

/// Run a query and extract its first row. Further rows are discarded.
///
/// # Errors
/// Returns `AdapterError::NoRows` for an empty result, otherwise errors from parameter
/// conversion, preparation, execution, or extraction.
pub async fn query_first(
    client: &ClientWrapper,
    sql: &str,
    args: &[RowValues],
) -> Result<Vec<RowValues>, AdapterError> {
    let sql = translate_placeholders(sql, PlaceholderStyle::Postgres);
    let converted = PgParams::convert_sql_params(args)?;
    let stmt = client.prepare_cached(&sql).await?;
    let rows = client.query(&stmt, converted.as_refs()).await?;
    let first = rows.first().ok_or(AdapterError::NoRows)?;
    extract_row(first)
}
