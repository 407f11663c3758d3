use std::error::Error;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::{Row, Statement};
use uuid::Uuid;

use crate::error::SqlError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Column bytes as the server sent them, for types without a dedicated mapping.
struct Undecoded(Vec<u8>);

impl<'a> FromSql<'a> for Undecoded {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Self(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Enums, `xml` and the text-like types travel as UTF-8; anything else stays raw wire bytes.
fn undecoded_value(ty: &Type, raw: Vec<u8>) -> RowValues {
    let textual = match ty.kind() {
        Kind::Enum(_) => true,
        Kind::Domain(inner) => <String as FromSql>::accepts(inner),
        _ => *ty == Type::XML || <String as FromSql>::accepts(ty),
    };
    if textual {
        match String::from_utf8(raw) {
            Ok(text) => RowValues::Text(text),
            Err(err) => RowValues::Blob(err.into_bytes()),
        }
    } else {
        RowValues::Blob(raw)
    }
}

fn numeric_value(value: Decimal) -> RowValues {
    let text = value.to_string();
    text.parse::<f64>()
        .map_or(RowValues::Text(text), RowValues::Float)
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// `numeric` becomes a float; `uuid`, `time` and `inet` become text. Enums and other
/// text-like types are read as text, and any remaining type comes back as its raw bytes.
///
/// # Errors
/// Returns `SqlError` if the column cannot be converted.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, SqlError> {
    let column_type = row.columns()[idx].type_();

    let value = match column_type.name() {
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(RowValues::Int),
        "oid" => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| RowValues::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(RowValues::Float),
        "numeric" => row.try_get::<_, Option<Decimal>>(idx)?.map(numeric_value),
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
        "time" => row
            .try_get::<_, Option<NaiveTime>>(idx)?
            .map(|t| RowValues::Text(t.format("%H:%M:%S%.f").to_string())),
        "uuid" => row
            .try_get::<_, Option<Uuid>>(idx)?
            .map(|u| RowValues::Text(u.to_string())),
        "inet" => row
            .try_get::<_, Option<IpAddr>>(idx)?
            .map(|ip| RowValues::Text(ip.to_string())),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx)?.map(RowValues::JSON),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(RowValues::Blob),
        "text" | "varchar" | "bpchar" | "name" | "unknown" | "citext" => {
            row.try_get::<_, Option<String>>(idx)?.map(RowValues::Text)
        }
        _ => row
            .try_get::<_, Option<Undecoded>>(idx)?
            .map(|raw| undecoded_value(column_type, raw.0)),
    };

    Ok(value.unwrap_or(RowValues::Null))
}

/// Build a result set using statement metadata for column names.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_statement(
    stmt: &Statement,
    rows: &[Row],
) -> Result<ResultSet, SqlError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
