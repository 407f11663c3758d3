//! Connection descriptors and DSN parsing.
//!
//! A DSN is `<engine>:<body>`, e.g. `pgsql:host=localhost;dbname=app`,
//! `sqlite::memory:` or `sqlsrv:Server=db,1433;Database=app`. The engine prefix is
//! resolved through [`DatabaseType::from_driver_name`]; the body is handed to the
//! engine's own config module when the connection is opened.

use std::fmt;

use crate::error::SqlError;
use crate::types::DatabaseType;

/// Where and as whom to connect. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    engine: DatabaseType,
    dsn: String,
    target: String,
    user: Option<String>,
    password: Option<String>,
}

impl ConnectionDescriptor {
    /// Parse a DSN and attach credentials.
    ///
    /// # Errors
    /// Returns a `SqlError` with SQLSTATE `IM002` if the DSN has no engine prefix or names
    /// an engine this build does not support.
    pub fn parse(
        dsn: &str,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Self, SqlError> {
        let dsn = dsn.trim();
        let (prefix, target) = dsn
            .split_once(':')
            .ok_or_else(|| SqlError::config(format!("invalid data source name: {dsn}")))?;
        let engine = DatabaseType::from_driver_name(prefix)
            .ok_or_else(|| SqlError::config(format!("could not find driver: {prefix}")))?;

        Ok(Self {
            engine,
            dsn: dsn.to_string(),
            target: target.to_string(),
            user,
            password,
        })
    }

    /// Descriptor for a connection handed in already open; the target is just the driver
    /// name since nothing else is known about it.
    #[must_use]
    pub(crate) fn adopted(engine: DatabaseType) -> Self {
        Self {
            engine,
            dsn: engine.driver_name().to_string(),
            target: engine.driver_name().to_string(),
            user: None,
            password: None,
        }
    }

    #[must_use]
    pub fn engine(&self) -> DatabaseType {
        self.engine
    }

    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// DSN body after the `engine:` prefix.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("engine", &self.engine)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Split a `key=value;key=value` DSN body. Keys are lower-cased; empty segments are skipped.
///
/// # Errors
/// Returns a `SqlError` (`IM002`) for a segment without `=`.
#[cfg(any(feature = "postgres", feature = "mssql"))]
pub(crate) fn key_value_pairs(body: &str) -> Result<Vec<(String, String)>, SqlError> {
    body.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                .ok_or_else(|| {
                    SqlError::config(format!("malformed DSN segment (expected key=value): {segment}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::sqlstate;

    #[cfg(feature = "sqlite")]
    #[test]
    fn splits_engine_prefix_only_once() {
        let desc = ConnectionDescriptor::parse("sqlite::memory:", None, None).unwrap();
        assert_eq!(desc.engine(), DatabaseType::Sqlite);
        assert_eq!(desc.target(), ":memory:");
    }

    #[test]
    fn unknown_engine_is_a_config_error() {
        let err = ConnectionDescriptor::parse("oci:dbname=//host/xe", None, None).unwrap_err();
        assert_eq!(err.sql_state(), sqlstate::DATA_SOURCE_NOT_FOUND);
        assert!(err.message().contains("could not find driver"));

        let err = ConnectionDescriptor::parse("no-prefix-here", None, None).unwrap_err();
        assert_eq!(err.sql_state(), sqlstate::DATA_SOURCE_NOT_FOUND);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn debug_output_hides_password() {
        let desc = ConnectionDescriptor::parse(
            "pgsql:host=localhost;dbname=app",
            Some("app".into()),
            Some("hunter2".into()),
        )
        .unwrap();
        let rendered = format!("{desc:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn key_value_body() {
        let pairs = key_value_pairs(" Host=db ; dbname=app;;").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("host".to_string(), "db".to_string()),
                ("dbname".to_string(), "app".to_string())
            ]
        );
        assert!(key_value_pairs("host").is_err());
    }
}
