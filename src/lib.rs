//! One small async driver contract over `tokio-postgres`, `rusqlite` and `tiberius`.
//!
//! An [`SqlAdapter`] is built from a PDO-style DSN (`pgsql:host=..;dbname=..`,
//! `sqlite::memory:`, `sqlsrv:Server=..;Database=..`), connects on first use, and exposes
//! the [`SqlDriver`] operations: queries shaped as tables, columns, rows or cells, writes
//! that report affected rows, transactions, escaping and a few metadata lookups. Every
//! failure comes back as one [`SqlError`] carrying the engine's SQLSTATE.
//!
//! ```rust,no_run
//! use sql_adapter::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlError> {
//! let mut db = SqlAdapter::builder("pgsql:host=localhost;dbname=app")
//!     .credentials("app", "secret")
//!     .build()?;
//! let names = db.get_col("SELECT name FROM users ORDER BY id", &[]).await?;
//! # let _ = names;
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "postgres", feature = "sqlite", feature = "mssql")))]
compile_error!("enable at least one of the `postgres`, `sqlite` or `mssql` features");

pub mod adapter;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
mod escape;
pub mod native;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use adapter::{AdapterBuilder, LastError, SqlAdapter};
pub use config::ConnectionDescriptor;
pub use dialect::PrepareOptions;
pub use driver::SqlDriver;
pub use error::{GENERIC_ERROR_CODE, SqlError};
pub use native::NativeConnection;
pub use results::{CustomDbRow, ResultSet};
pub use types::{DatabaseType, RowValues};
