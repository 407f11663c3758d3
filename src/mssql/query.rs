use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tiberius::{ColumnData, FromSql};

use super::config::MssqlClient;
use super::params::bind_query_params;
use crate::error::SqlError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Run a query and collect its first result set.
///
/// Returns `None` when the batch produced no result set at all (plain DML or DDL).
///
/// # Errors
/// Returns `SqlError` if execution or value extraction fails.
pub async fn build_result_set(
    client: &mut MssqlClient,
    query: &str,
    params: &[RowValues],
) -> Result<Option<ResultSet>, SqlError> {
    let query_builder = bind_query_params(query, params);
    let mut stream = query_builder.query(client).await?;

    let column_names: Option<Vec<String>> = stream
        .columns()
        .await?
        .map(|columns| columns.iter().map(|col| col.name().to_string()).collect());

    // Drains the stream either way so the connection is ready for the next request.
    let rows = stream.into_first_result().await?;

    let Some(column_names) = column_names else {
        return Ok(None);
    };

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(row.len());
        for (_, data) in row.cells() {
            row_values.push(extract_value(data)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(Some(result_set))
}

/// Convert one cell to a `RowValues`.
pub(crate) fn extract_value(data: &ColumnData<'static>) -> Result<RowValues, SqlError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| RowValues::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| RowValues::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| RowValues::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(RowValues::Int),
        ColumnData::F32(v) => v.map(|v| RowValues::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(RowValues::Float),
        ColumnData::Bit(v) => v.map(RowValues::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| RowValues::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| RowValues::Text(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| RowValues::Blob(b.to_vec())),
        ColumnData::Numeric(v) => v.map(|n| {
            let text = n.to_string();
            text.parse::<f64>()
                .map_or(RowValues::Text(text), RowValues::Float)
        }),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|xml| RowValues::Text((**xml).clone().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map(RowValues::Timestamp)
        }
        ColumnData::DateTimeOffset(_) => {
            DateTime::<Utc>::from_sql(data)?.map(|dt| RowValues::Timestamp(dt.naive_utc()))
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?
            .map(|d| RowValues::Timestamp(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(_) => {
            NaiveTime::from_sql(data)?.map(|t| RowValues::Text(t.format("%H:%M:%S%.f").to_string()))
        }
    };

    Ok(value.unwrap_or(RowValues::Null))
}
