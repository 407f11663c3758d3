use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, params_from_iter};

use crate::error::SqlError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and fetch every row.
///
/// # Errors
/// Returns `SqlError` if execution or value extraction fails.
pub fn build_result_set(stmt: &mut Statement, params: &[Value]) -> Result<ResultSet, SqlError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Read path: fetch all rows when the statement has columns; otherwise just run it.
///
/// # Errors
/// Returns `SqlError` from execution.
pub fn fetch_all(stmt: &mut Statement, params: &[Value]) -> Result<Option<ResultSet>, SqlError> {
    if stmt.column_count() == 0 {
        stmt.execute(params_from_iter(params.iter()))?;
        return Ok(None);
    }
    build_result_set(stmt, params).map(Some)
}

/// Write path: run the statement and report the changed row count.
///
/// Returns `None` for a statement that yields rows (`SELECT`, `... RETURNING`); it is stepped
/// to completion and the caller reads the count off the connection.
///
/// # Errors
/// Returns `SqlError` from execution.
pub fn execute_dml(stmt: &mut Statement, params: &[Value]) -> Result<Option<usize>, SqlError> {
    if stmt.column_count() == 0 {
        return Ok(Some(stmt.execute(params_from_iter(params.iter()))?));
    }
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while rows.next()?.is_some() {}
    Ok(None)
}
