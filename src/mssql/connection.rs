use std::fmt;

use super::client::create_mssql_client;
use super::config::{MssqlClient, MssqlOptions};
use super::params::bind_query_params;
use super::query::build_result_set;
use crate::config::ConnectionDescriptor;
use crate::dialect::PrepareOptions;
use crate::error::{SqlError, sqlstate};
use crate::escape::quote_literal;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Native SQL Server handle. Statements go through `sp_executesql` and are never cached.
pub struct MssqlConnection {
    client: MssqlClient,
    options: PrepareOptions,
    in_transaction: bool,
}

impl MssqlConnection {
    pub(crate) fn new(client: MssqlClient, options: PrepareOptions) -> Self {
        Self {
            client,
            options,
            in_transaction: false,
        }
    }

    pub(crate) async fn connect(
        desc: &ConnectionDescriptor,
        options: PrepareOptions,
    ) -> Result<Self, SqlError> {
        let opts = MssqlOptions::from_descriptor(desc)?;
        Ok(Self::new(create_mssql_client(&opts).await?, options))
    }

    /// Prepare options this connection was opened with.
    #[must_use]
    pub fn prepare_options(&self) -> PrepareOptions {
        self.options
    }

    /// The underlying tiberius client.
    pub fn client(&mut self) -> &mut MssqlClient {
        &mut self.client
    }

    pub(crate) async fn query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<ResultSet>, SqlError> {
        build_result_set(&mut self.client, sql, params).await
    }

    pub(crate) async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlError> {
        let exec_result = bind_query_params(sql, params)
            .execute(&mut self.client)
            .await?;
        let rows_affected: u64 = exec_result.rows_affected().iter().sum();
        usize::try_from(rows_affected).map_err(|e| {
            SqlError::new(
                format!("invalid rows affected count: {e}"),
                sqlstate::GENERAL_ERROR,
            )
        })
    }

    /// Last identity value generated in this session; 0 when none has been.
    pub(crate) async fn last_insert_id(&mut self) -> Result<i64, SqlError> {
        let row = self
            .client
            .simple_query("SELECT CAST(@@IDENTITY AS BIGINT)")
            .await?
            .into_row()
            .await?;
        Ok(match row {
            Some(row) => row.try_get::<i64, _>(0)?.unwrap_or(0),
            None => 0,
        })
    }

    pub(crate) fn quote(&self, value: &str) -> String {
        quote_literal(value)
    }

    pub(crate) async fn version(&mut self) -> Result<String, SqlError> {
        let row = self
            .client
            .simple_query("SELECT @@VERSION")
            .await?
            .into_row()
            .await?;
        let Some(row) = row else {
            return Ok(String::new());
        };
        Ok(row
            .try_get::<&str, _>(0)?
            .map(str::to_string)
            .unwrap_or_default())
    }

    pub(crate) async fn begin(&mut self) -> Result<(), SqlError> {
        if self.in_transaction {
            return Err(SqlError::transaction_state(
                "There is already an active transaction",
            ));
        }
        self.client.execute("BEGIN TRANSACTION", &[]).await?;
        self.in_transaction = true;
        Ok(())
    }

    pub(crate) async fn commit(&mut self) -> Result<(), SqlError> {
        self.finish_transaction("COMMIT TRANSACTION").await
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), SqlError> {
        self.finish_transaction("ROLLBACK TRANSACTION").await
    }

    async fn finish_transaction(&mut self, statement: &str) -> Result<(), SqlError> {
        if !self.in_transaction {
            return Err(SqlError::transaction_state("There is no active transaction"));
        }
        self.in_transaction = false;
        self.client.execute(statement, &[]).await?;
        Ok(())
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("options", &self.options)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl From<MssqlClient> for MssqlConnection {
    fn from(client: MssqlClient) -> Self {
        Self::new(
            client,
            crate::dialect::prepare_options(crate::types::DatabaseType::Mssql),
        )
    }
}
