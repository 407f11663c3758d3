use std::fmt;
use std::sync::Arc;

use rusqlite::Statement;
use tokio::sync::Mutex;

use super::config;
use super::params::Params;
use super::query;
use crate::dialect::PrepareOptions;
use crate::error::{SqlError, sqlstate};
use crate::escape::quote_literal;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A rusqlite connection shared with the blocking pool.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Native `SQLite` handle. Every call runs on tokio's blocking pool.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
    options: PrepareOptions,
}

impl SqliteConnection {
    pub(crate) fn new(conn: rusqlite::Connection, options: PrepareOptions) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            options,
        }
    }

    /// Open the database named by a `sqlite:` DSN body.
    ///
    /// # Errors
    /// Returns `SqlError` if the file cannot be opened or configured.
    pub(crate) async fn open(target: &str, options: PrepareOptions) -> Result<Self, SqlError> {
        let target = target.to_owned();
        let conn = tokio::task::spawn_blocking(move || config::open(&target))
            .await
            .map_err(join_error)??;
        Ok(Self::new(conn, options))
    }

    /// Run a closure against the raw rusqlite connection on the blocking pool.
    ///
    /// # Errors
    /// Returns whatever the closure returns, or a `SqlError` if the blocking task panicked.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }

    pub(crate) async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<ResultSet>, SqlError> {
        let sql = sql.to_owned();
        let params = Params::convert(params);
        let cache = self.options.cache_statements;
        self.with_connection(move |conn| {
            with_statement(conn, &sql, cache, |stmt| {
                query::fetch_all(stmt, params.as_values())
            })
        })
        .await
    }

    pub(crate) async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<usize, SqlError> {
        let sql = sql.to_owned();
        let params = Params::convert(params);
        let cache = self.options.cache_statements;
        self.with_connection(move |conn| {
            let before = conn.total_changes();
            let counted = with_statement(conn, &sql, cache, |stmt| {
                query::execute_dml(stmt, params.as_values())
            })?;
            Ok(counted.unwrap_or_else(|| changes_since(conn, before)))
        })
        .await
    }

    pub(crate) async fn last_insert_id(&self) -> Result<i64, SqlError> {
        self.with_connection(|conn| Ok(conn.last_insert_rowid()))
            .await
    }

    pub(crate) fn quote(&self, value: &str) -> String {
        quote_literal(value)
    }

    /// Version of the linked `SQLite` library.
    pub(crate) fn version(&self) -> String {
        rusqlite::version().to_string()
    }

    pub(crate) async fn begin(&self) -> Result<(), SqlError> {
        self.with_connection(|conn| {
            if !conn.is_autocommit() {
                return Err(SqlError::transaction_state(
                    "There is already an active transaction",
                ));
            }
            conn.execute_batch("BEGIN")?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn commit(&self) -> Result<(), SqlError> {
        self.finish_transaction("COMMIT").await
    }

    pub(crate) async fn rollback(&self) -> Result<(), SqlError> {
        self.finish_transaction("ROLLBACK").await
    }

    async fn finish_transaction(&self, statement: &'static str) -> Result<(), SqlError> {
        self.with_connection(move |conn| {
            if conn.is_autocommit() {
                return Err(SqlError::transaction_state("There is no active transaction"));
            }
            conn.execute_batch(statement)?;
            Ok(())
        })
        .await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Prepare through the connection's statement cache or as a one-off statement.
fn with_statement<R>(
    conn: &rusqlite::Connection,
    sql: &str,
    cache: bool,
    func: impl FnOnce(&mut Statement<'_>) -> Result<R, SqlError>,
) -> Result<R, SqlError> {
    if cache {
        let mut stmt = conn.prepare_cached(sql)?;
        func(&mut stmt)
    } else {
        let mut stmt = conn.prepare(sql)?;
        func(&mut stmt)
    }
}

/// Rows changed by a row-returning statement that just completed. `changes()` still holds
/// the previous write's count when nothing was written, so it only counts if the running
/// total moved.
fn changes_since(conn: &rusqlite::Connection, total_before: u64) -> usize {
    if conn.total_changes() == total_before {
        return 0;
    }
    usize::try_from(conn.changes()).unwrap_or(usize::MAX)
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(join_error)?
}

fn join_error(err: tokio::task::JoinError) -> SqlError {
    SqlError::new(
        format!("sqlite blocking task failed: {err}"),
        sqlstate::GENERAL_ERROR,
    )
    .with_source(err)
}

impl From<rusqlite::Connection> for SqliteConnection {
    fn from(conn: rusqlite::Connection) -> Self {
        Self::new(conn, crate::dialect::prepare_options(crate::types::DatabaseType::Sqlite))
    }
}
