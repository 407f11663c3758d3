use std::collections::HashMap;
use std::fmt;

use tokio_postgres::{Client, NoTls, Statement};

use super::config;
use super::params::Params;
use super::query::build_result_set_from_statement;
use crate::config::ConnectionDescriptor;
use crate::dialect::PrepareOptions;
use crate::error::SqlError;
use crate::escape::quote_literal;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// Native `PostgreSQL` handle.
///
/// With statement caching off (the default for this engine) each call prepares its own
/// statement and the server-side statement is closed as soon as it is dropped.
pub struct PostgresConnection {
    client: Client,
    options: PrepareOptions,
    statements: HashMap<String, Statement>,
    in_transaction: bool,
}

impl PostgresConnection {
    pub(crate) fn new(client: Client, options: PrepareOptions) -> Self {
        Self {
            client,
            options,
            statements: HashMap::new(),
            in_transaction: false,
        }
    }

    /// Connect and spawn the connection driver task onto the current runtime.
    pub(crate) async fn connect(
        desc: &ConnectionDescriptor,
        options: PrepareOptions,
    ) -> Result<Self, SqlError> {
        let config = config::build_config(desc)?;
        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            // Authentication and missing-database failures carry a server SQLSTATE.
            if e.code().is_some() {
                SqlError::from(e)
            } else {
                SqlError::connect(e)
            }
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "postgres connection closed with error");
            }
        });

        Ok(Self::new(client, options))
    }

    /// The underlying `tokio_postgres` client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn statement(&mut self, sql: &str) -> Result<Statement, SqlError> {
        if !self.options.cache_statements {
            return Ok(self.client.prepare(sql).await?);
        }
        if let Some(stmt) = self.statements.get(sql) {
            return Ok(stmt.clone());
        }
        let stmt = self.client.prepare(sql).await?;
        self.statements.insert(sql.to_owned(), stmt.clone());
        Ok(stmt)
    }

    pub(crate) async fn query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<ResultSet>, SqlError> {
        let stmt = self.statement(sql).await?;
        let converted = Params::convert(params);

        if stmt.columns().is_empty() {
            self.client.execute(&stmt, converted.as_refs()).await?;
            return Ok(None);
        }

        let rows = self.client.query(&stmt, converted.as_refs()).await?;
        build_result_set_from_statement(&stmt, &rows).map(Some)
    }

    pub(crate) async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlError> {
        let stmt = self.statement(sql).await?;
        let converted = Params::convert(params);
        let rows = self.client.execute(&stmt, converted.as_refs()).await?;
        usize::try_from(rows).map_err(|e| {
            SqlError::new(
                format!("postgres affected rows conversion error: {e}"),
                crate::error::sqlstate::GENERAL_ERROR,
            )
        })
    }

    /// Value most recently produced by a sequence in this session.
    pub(crate) async fn last_insert_id(&self) -> Result<i64, SqlError> {
        let row = self.client.query_one("SELECT lastval()", &[]).await?;
        Ok(row.try_get(0)?)
    }

    pub(crate) fn quote(&self, value: &str) -> String {
        quote_literal(value)
    }

    pub(crate) async fn version(&self) -> Result<String, SqlError> {
        let row = self.client.query_one("SHOW server_version", &[]).await?;
        Ok(row.try_get(0)?)
    }

    pub(crate) async fn begin(&mut self) -> Result<(), SqlError> {
        if self.in_transaction {
            return Err(SqlError::transaction_state(
                "There is already an active transaction",
            ));
        }
        self.client.batch_execute("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    pub(crate) async fn commit(&mut self) -> Result<(), SqlError> {
        self.finish_transaction("COMMIT").await
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), SqlError> {
        self.finish_transaction("ROLLBACK").await
    }

    async fn finish_transaction(&mut self, statement: &str) -> Result<(), SqlError> {
        if !self.in_transaction {
            return Err(SqlError::transaction_state("There is no active transaction"));
        }
        // The server leaves the transaction whether or not COMMIT succeeds.
        self.in_transaction = false;
        self.client.batch_execute(statement).await?;
        Ok(())
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("options", &self.options)
            .field("cached_statements", &self.statements.len())
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl From<Client> for PostgresConnection {
    fn from(client: Client) -> Self {
        Self::new(client, crate::dialect::prepare_options(DatabaseType::Postgres))
    }
}
