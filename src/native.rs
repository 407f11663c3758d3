//! The native client handle behind an adapter, one variant per compiled-in engine.

use crate::config::ConnectionDescriptor;
use crate::dialect::PrepareOptions;
use crate::error::SqlError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "mssql")]
use crate::mssql::{MssqlClient, MssqlConnection};
#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

/// An open connection to one of the supported engines.
///
/// Build one from an already-connected client with `From` and hand it to
/// [`SqlAdapter::from_native`](crate::SqlAdapter::from_native), or let the adapter open it
/// from a DSN.
#[derive(Debug)]
pub enum NativeConnection {
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "mssql")]
    Mssql(MssqlConnection),
}

impl NativeConnection {
    /// Open the connection a descriptor names.
    ///
    /// # Errors
    /// Returns `SqlError` if the DSN body is invalid or the engine refuses the connection.
    pub(crate) async fn open(
        desc: &ConnectionDescriptor,
        options: PrepareOptions,
    ) -> Result<Self, SqlError> {
        match desc.engine() {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(Self::Postgres(
                PostgresConnection::connect(desc, options).await?,
            )),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(Self::Sqlite(
                SqliteConnection::open(desc.target(), options).await?,
            )),
            #[cfg(feature = "mssql")]
            DatabaseType::Mssql => Ok(Self::Mssql(
                MssqlConnection::connect(desc, options).await?,
            )),
        }
    }

    /// Engine identifier derived from the handle itself.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "mssql")]
            Self::Mssql(_) => DatabaseType::Mssql,
        }
    }

    pub(crate) async fn query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<ResultSet>, SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.query(sql, params).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.query(sql, params).await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.query(sql, params).await,
        }
    }

    pub(crate) async fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute(sql, params).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute(sql, params).await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.execute(sql, params).await,
        }
    }

    pub(crate) async fn last_insert_id(&mut self) -> Result<i64, SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.last_insert_id().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.last_insert_id().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.last_insert_id().await,
        }
    }

    /// The engine's quoted literal for `value`, including the surrounding quotes.
    pub(crate) fn quote(&self, value: &str) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.quote(value),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.quote(value),
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.quote(value),
        }
    }

    pub(crate) async fn version(&mut self) -> Result<String, SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.version().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => Ok(conn.version()),
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.version().await,
        }
    }

    pub(crate) async fn begin(&mut self) -> Result<(), SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.begin().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.begin().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.begin().await,
        }
    }

    pub(crate) async fn commit(&mut self) -> Result<(), SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.commit().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.commit().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.commit().await,
        }
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), SqlError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.rollback().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.rollback().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.rollback().await,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Client> for NativeConnection {
    fn from(client: tokio_postgres::Client) -> Self {
        Self::Postgres(PostgresConnection::from(client))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Connection> for NativeConnection {
    fn from(conn: rusqlite::Connection) -> Self {
        Self::Sqlite(SqliteConnection::from(conn))
    }
}

#[cfg(feature = "mssql")]
impl From<MssqlClient> for NativeConnection {
    fn from(client: MssqlClient) -> Self {
        Self::Mssql(MssqlConnection::from(client))
    }
}
