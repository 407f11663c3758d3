use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ConnectionDescriptor;
use crate::dialect::{self, PrepareOptions};
use crate::driver::SqlDriver;
use crate::error::{SqlError, sqlstate};
use crate::escape::strip_outer_quotes;
use crate::native::NativeConnection;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// Snapshot of the last failed operation, kept until the next operation that touches the
/// native client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    sql_state: String,
    driver_code: Option<i64>,
    message: String,
}

impl LastError {
    #[must_use]
    pub fn sql_state(&self) -> &str {
        &self.sql_state
    }

    #[must_use]
    pub fn driver_code(&self) -> Option<i64> {
        self.driver_code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&SqlError> for LastError {
    fn from(err: &SqlError) -> Self {
        Self {
            sql_state: err.sql_state().to_string(),
            driver_code: err.driver_code(),
            message: err.message().to_string(),
        }
    }
}

/// Fluent builder for [`SqlAdapter`].
#[derive(Clone)]
pub struct AdapterBuilder {
    dsn: String,
    user: Option<String>,
    password: Option<String>,
    prepare_options: Option<PrepareOptions>,
    debug: bool,
}

impl AdapterBuilder {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            user: None,
            password: None,
            prepare_options: None,
            debug: false,
        }
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn credentials(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user(user).password(password)
    }

    /// Override the engine's default prepare options. SQL Server connections ignore this and
    /// never cache statements.
    #[must_use]
    pub fn prepare_options(mut self, options: PrepareOptions) -> Self {
        self.prepare_options = Some(options);
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parse the DSN and build a not-yet-connected adapter.
    ///
    /// # Errors
    /// Returns `SqlError` (`IM002`) if the DSN is malformed or names an unsupported engine.
    pub fn build(self) -> Result<SqlAdapter, SqlError> {
        let descriptor = ConnectionDescriptor::parse(&self.dsn, self.user, self.password)?;
        Ok(SqlAdapter {
            descriptor,
            prepare_override: self.prepare_options,
            handle: None,
            debug: self.debug,
            affected_rows: 0,
            raw_result: None,
            last_error: None,
        })
    }
}

impl fmt::Debug for AdapterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("dsn", &self.dsn)
            .field("user", &self.user)
            .field("prepare_options", &self.prepare_options)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// A lazily connected driver over one native connection.
///
/// ```rust,no_run
/// use sql_adapter::prelude::*;
///
/// # async fn demo() -> Result<(), SqlError> {
/// let mut db = SqlAdapter::new("sqlite::memory:", None, None)?;
/// db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER)", &[]).await?;
/// db.execute("INSERT INTO t (x) VALUES (?1)", &[RowValues::Int(5)]).await?;
/// let x = db.get_cell("SELECT x FROM t", &[]).await?;
/// assert_eq!(x, Some(RowValues::Int(5)));
/// # Ok(())
/// # }
/// ```
pub struct SqlAdapter {
    descriptor: ConnectionDescriptor,
    prepare_override: Option<PrepareOptions>,
    handle: Option<NativeConnection>,
    debug: bool,
    affected_rows: usize,
    raw_result: Option<ResultSet>,
    last_error: Option<LastError>,
}

impl SqlAdapter {
    /// Store the DSN and credentials; nothing connects until the first operation.
    ///
    /// # Errors
    /// Returns `SqlError` (`IM002`) if the DSN is malformed or names an unsupported engine.
    pub fn new(dsn: &str, user: Option<&str>, password: Option<&str>) -> Result<Self, SqlError> {
        let mut builder = AdapterBuilder::new(dsn);
        builder.user = user.map(str::to_string);
        builder.password = password.map(str::to_string);
        builder.build()
    }

    #[must_use]
    pub fn builder(dsn: impl Into<String>) -> AdapterBuilder {
        AdapterBuilder::new(dsn)
    }

    /// Adopt a connection that is already open. The engine is read off the handle.
    #[must_use]
    pub fn from_native(handle: NativeConnection) -> Self {
        let engine = handle.database_type();
        debug!(engine = %engine, "adopted native connection");
        Self {
            descriptor: ConnectionDescriptor::adopted(engine),
            prepare_override: None,
            handle: Some(handle),
            debug: false,
            affected_rows: 0,
            raw_result: None,
            last_error: None,
        }
    }

    /// The native handle, connecting first if needed.
    ///
    /// # Errors
    /// Returns `SqlError` if the connection cannot be opened.
    pub async fn native(&mut self) -> Result<&mut NativeConnection, SqlError> {
        self.last_error = None;
        let result = self.connected().await.map(|_| ());
        self.track(result)?;
        self.handle.as_mut().ok_or_else(|| {
            SqlError::new(
                "native connection missing after connect",
                sqlstate::GENERAL_ERROR,
            )
        })
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Prepare options new connections are opened with: the builder override, else the
    /// engine's entry in the dialect table.
    #[must_use]
    pub fn prepare_options(&self) -> PrepareOptions {
        dialect::effective_options(self.descriptor.engine(), self.prepare_override)
    }

    async fn connected(&mut self) -> Result<&mut NativeConnection, SqlError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                let options = self.prepare_options();
                debug!(
                    engine = %self.descriptor.engine(),
                    cache_statements = options.cache_statements,
                    "connecting"
                );
                NativeConnection::open(&self.descriptor, options).await?
            }
        };
        Ok(self.handle.insert(handle))
    }

    fn record(&mut self, err: SqlError) -> SqlError {
        self.last_error = Some(LastError::from(&err));
        err
    }

    /// Run `result` through the last-error bookkeeping.
    fn track<T>(&mut self, result: Result<T, SqlError>) -> Result<T, SqlError> {
        result.map_err(|err| self.record(err))
    }

    fn trace(&self, sql: &str, params: &[RowValues]) {
        if self.debug {
            info!(sql, params = ?params, "executing statement");
        }
    }

    async fn run_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlError> {
        self.trace(sql, params);
        let raw = self.connected().await?.query(sql, params).await?;
        self.raw_result.clone_from(&raw);

        let rows = raw.unwrap_or_default();
        if self.debug && !rows.is_empty() {
            info!("resultset: {} rows", rows.len());
        }
        Ok(rows)
    }

    async fn run_execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlError> {
        self.trace(sql, params);
        let affected = self.connected().await?.execute(sql, params).await?;
        self.affected_rows = affected;
        Ok(affected)
    }
}

impl fmt::Debug for SqlAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlAdapter")
            .field("descriptor", &self.descriptor)
            .field("connected", &self.is_connected())
            .field("debug", &self.debug)
            .field("affected_rows", &self.affected_rows)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SqlDriver for SqlAdapter {
    async fn connect(&mut self) -> Result<(), SqlError> {
        self.last_error = None;
        let result = self.connected().await.map(|_| ());
        self.track(result)
    }

    async fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlError> {
        self.last_error = None;
        let result = self.run_query(sql, params).await;
        self.track(result)
    }

    async fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlError> {
        self.last_error = None;
        let result = self.run_execute(sql, params).await;
        self.track(result)
    }

    fn error_no(&self) -> &str {
        self.last_error
            .as_ref()
            .map_or(sqlstate::SUCCESS, |err| err.sql_state.as_str())
    }

    fn error_message(&self) -> &str {
        self.last_error
            .as_ref()
            .map_or("", |err| err.message.as_str())
    }

    async fn escape(&mut self, value: &str) -> Result<String, SqlError> {
        self.last_error = None;
        let result = self
            .connected()
            .await
            .map(|conn| strip_outer_quotes(&conn.quote(value)));
        self.track(result)
    }

    async fn last_insert_id(&mut self) -> Result<i64, SqlError> {
        self.last_error = None;
        let result = match self.connected().await {
            Ok(conn) => conn.last_insert_id().await,
            Err(err) => Err(err),
        };
        self.track(result)
    }

    fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    async fn set_debug_mode(&mut self, enabled: bool) -> Result<(), SqlError> {
        self.last_error = None;
        let result = self.connected().await.map(|_| ());
        self.track(result)?;
        self.debug = enabled;
        Ok(())
    }

    fn raw_result(&self) -> Option<&ResultSet> {
        self.raw_result.as_ref()
    }

    async fn start_transaction(&mut self) -> Result<(), SqlError> {
        self.last_error = None;
        let result = match self.connected().await {
            Ok(conn) => conn.begin().await,
            Err(err) => Err(err),
        };
        if result.is_ok() {
            debug!(engine = %self.descriptor.engine(), "transaction started");
        }
        self.track(result)
    }

    async fn commit(&mut self) -> Result<(), SqlError> {
        self.last_error = None;
        let result = match self.connected().await {
            Ok(conn) => conn.commit().await,
            Err(err) => Err(err),
        };
        if result.is_ok() {
            debug!(engine = %self.descriptor.engine(), "transaction committed");
        }
        self.track(result)
    }

    async fn rollback(&mut self) -> Result<(), SqlError> {
        self.last_error = None;
        let result = match self.connected().await {
            Ok(conn) => conn.rollback().await,
            Err(err) => Err(err),
        };
        if result.is_ok() {
            debug!(engine = %self.descriptor.engine(), "transaction rolled back");
        }
        self.track(result)
    }

    async fn database_type(&mut self) -> Result<DatabaseType, SqlError> {
        self.last_error = None;
        let result = self.connected().await.map(|conn| conn.database_type());
        self.track(result)
    }

    async fn database_version(&mut self) -> Result<String, SqlError> {
        self.last_error = None;
        let result = match self.connected().await {
            Ok(conn) => conn.version().await,
            Err(err) => Err(err),
        };
        self.track(result)
    }
}
