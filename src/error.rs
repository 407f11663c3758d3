use std::error::Error as StdError;

use thiserror::Error;

/// Generic numeric code carried by every [`SqlError`]. The adapter never interprets
/// native codes numerically, so this is always the same sentinel.
pub const GENERIC_ERROR_CODE: i32 = 0;

/// Well-known SQLSTATE values produced by the adapter itself.
pub mod sqlstate {
    /// Successful completion; the "no error" sentinel returned by `error_no()`.
    pub const SUCCESS: &str = "00000";
    /// General error, used when the engine does not provide a more specific state.
    pub const GENERAL_ERROR: &str = "HY000";
    /// Wrong number of bound parameters.
    pub const INVALID_PARAMETER_NUMBER: &str = "HY093";
    /// Integrity constraint violation.
    pub const INTEGRITY_CONSTRAINT_VIOLATION: &str = "23000";
    /// Invalid transaction state.
    pub const INVALID_TRANSACTION_STATE: &str = "25000";
    /// Client unable to establish connection.
    pub const UNABLE_TO_CONNECT: &str = "08001";
    /// Connection failure on an established connection.
    pub const CONNECTION_FAILURE: &str = "08006";
    /// Communication link failure.
    pub const COMMUNICATION_LINK_FAILURE: &str = "08S01";
    /// Data source name not found or malformed.
    pub const DATA_SOURCE_NOT_FOUND: &str = "IM002";
    /// Syntax error or access rule violation.
    pub const SYNTAX_ERROR: &str = "42000";
    /// Base table or view not found.
    pub const TABLE_NOT_FOUND: &str = "42S02";
    /// Column not found.
    pub const COLUMN_NOT_FOUND: &str = "42S22";
}

/// The single error type every adapter operation returns.
///
/// Carries the native message, the fixed [`GENERIC_ERROR_CODE`], the engine's SQLSTATE and,
/// when the engine has one, its own numeric error code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SqlError {
    message: String,
    code: i32,
    sql_state: String,
    driver_code: Option<i64>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SqlError {
    #[must_use]
    pub fn new(message: impl Into<String>, sql_state: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: GENERIC_ERROR_CODE,
            sql_state: sql_state.into(),
            driver_code: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_driver_code(mut self, driver_code: i64) -> Self {
        self.driver_code = Some(driver_code);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Malformed or unsupported connection string.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(message, sqlstate::DATA_SOURCE_NOT_FOUND)
    }

    /// The native client could not open a connection.
    #[must_use]
    pub fn connect(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::new(
            format!("connection failed: {source}"),
            sqlstate::UNABLE_TO_CONNECT,
        )
        .with_source(source)
    }

    /// Transaction demarcation called in the wrong state.
    #[must_use]
    pub fn transaction_state(message: impl Into<String>) -> Self {
        Self::new(message, sqlstate::INVALID_TRANSACTION_STATE)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Always [`GENERIC_ERROR_CODE`].
    #[must_use]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Engine-native status code (SQLSTATE).
    #[must_use]
    pub fn sql_state(&self) -> &str {
        &self.sql_state
    }

    /// Engine-specific numeric code, e.g. the `SQLite` extended result code.
    #[must_use]
    pub fn driver_code(&self) -> Option<i64> {
        self.driver_code
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for SqlError {
    fn from(err: tokio_postgres::Error) -> Self {
        let sql_state = match err.code() {
            Some(state) => state.code().to_string(),
            None if err.is_closed() => sqlstate::CONNECTION_FAILURE.to_string(),
            None => sqlstate::GENERAL_ERROR.to_string(),
        };
        // The server error carries the useful text; the outer Display is just "db error".
        let message = err
            .as_db_error()
            .map_or_else(|| err.to_string(), |db| db.message().to_string());
        SqlError::new(message, sql_state).with_source(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SqlError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => {
                let sql_state = if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation {
                    sqlstate::INTEGRITY_CONSTRAINT_VIOLATION
                } else {
                    sqlstate::GENERAL_ERROR
                };
                let driver_code = i64::from(ffi_err.extended_code);
                SqlError::new(err.to_string(), sql_state)
                    .with_driver_code(driver_code)
                    .with_source(err)
            }
            rusqlite::Error::InvalidParameterCount(..) => {
                SqlError::new(err.to_string(), sqlstate::INVALID_PARAMETER_NUMBER).with_source(err)
            }
            _ => SqlError::new(err.to_string(), sqlstate::GENERAL_ERROR).with_source(err),
        }
    }
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for SqlError {
    fn from(err: tiberius::error::Error) -> Self {
        match &err {
            tiberius::error::Error::Server(token) => {
                let number = token.code();
                SqlError::new(token.message().to_string(), mssql_sql_state(number))
                    .with_driver_code(i64::from(number))
                    .with_source(err)
            }
            tiberius::error::Error::Io { .. } => {
                SqlError::new(err.to_string(), sqlstate::COMMUNICATION_LINK_FAILURE)
                    .with_source(err)
            }
            _ => SqlError::new(err.to_string(), sqlstate::GENERAL_ERROR).with_source(err),
        }
    }
}

/// SQLSTATE for a SQL Server error number, following the ODBC driver's mapping for the
/// numbers callers usually branch on.
#[cfg(feature = "mssql")]
#[must_use]
pub(crate) fn mssql_sql_state(number: u32) -> &'static str {
    match number {
        2627 | 2601 | 547 | 515 => sqlstate::INTEGRITY_CONSTRAINT_VIOLATION,
        208 => sqlstate::TABLE_NOT_FOUND,
        207 => sqlstate::COLUMN_NOT_FOUND,
        102 | 156 => sqlstate::SYNTAX_ERROR,
        _ => sqlstate::GENERAL_ERROR,
    }
}
