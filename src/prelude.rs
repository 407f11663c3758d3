//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::adapter::{AdapterBuilder, LastError, SqlAdapter};
pub use crate::config::ConnectionDescriptor;
pub use crate::dialect::PrepareOptions;
pub use crate::driver::SqlDriver;
pub use crate::error::{SqlError, sqlstate};
pub use crate::native::NativeConnection;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnection;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlClient, MssqlConnection, MssqlOptions};
