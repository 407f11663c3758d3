use async_trait::async_trait;

use crate::error::SqlError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::{DatabaseType, RowValues};

/// The uniform contract a persistence layer is written against.
///
/// [`SqlAdapter`](crate::SqlAdapter) is the implementation backed by a real engine; tests can
/// substitute their own. Every method that needs the native client connects first, so no
/// "not connected" failure is ever observable.
#[async_trait]
pub trait SqlDriver: Send {
    /// Open the native connection if it is not open yet. Idempotent.
    async fn connect(&mut self) -> Result<(), SqlError>;

    /// Run a statement and return every row it produced.
    ///
    /// A statement that produces no columns (DDL, plain DML) is still executed and yields an
    /// empty result set.
    async fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlError>;

    /// First column of every row, in row order.
    async fn get_col(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<RowValues>, SqlError> {
        Ok(self.query(sql, params).await?.into_first_column())
    }

    /// First row, if any.
    async fn get_row(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, SqlError> {
        Ok(self.query(sql, params).await?.into_first_row())
    }

    /// First value of the first row, if any.
    async fn get_cell(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<RowValues>, SqlError> {
        Ok(self.query(sql, params).await?.into_first_value())
    }

    /// Run a statement for its side effects and return the affected row count.
    async fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlError>;

    /// SQLSTATE of the last failed operation, or `"00000"` if the last one succeeded.
    fn error_no(&self) -> &str;

    /// Message of the last failed operation, or `""`.
    fn error_message(&self) -> &str;

    /// Escape `value` for interpolation between single quotes.
    async fn escape(&mut self, value: &str) -> Result<String, SqlError>;

    async fn last_insert_id(&mut self) -> Result<i64, SqlError>;

    /// Row count recorded by the last `execute`.
    fn affected_rows(&self) -> usize;

    /// Toggle tracing of statement text and parameters.
    async fn set_debug_mode(&mut self, enabled: bool) -> Result<(), SqlError>;

    /// Rows fetched by the last `query`; `None` before any query or when the last statement
    /// produced no columns.
    fn raw_result(&self) -> Option<&ResultSet>;

    async fn start_transaction(&mut self) -> Result<(), SqlError>;

    async fn commit(&mut self) -> Result<(), SqlError>;

    async fn rollback(&mut self) -> Result<(), SqlError>;

    async fn database_type(&mut self) -> Result<DatabaseType, SqlError>;

    async fn database_version(&mut self) -> Result<String, SqlError>;
}
