//! Embedded `PostgreSQL` for tests and benchmarks.

use std::error::Error;

use postgresql_embedded::PostgreSQL;

use crate::adapter::SqlAdapter;
use crate::driver::SqlDriver;
use crate::error::SqlError;

/// A running embedded `PostgreSQL` instance and how to reach it.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// `pgsql:` DSN for the test database, without credentials.
    pub dsn: String,
    pub user: String,
    pub password: String,
}

impl EmbeddedPostgres {
    /// A fresh, not-yet-connected adapter for the test database.
    ///
    /// # Errors
    /// Returns `SqlError` if the DSN cannot be parsed.
    pub fn adapter(&self) -> Result<SqlAdapter, SqlError> {
        SqlAdapter::builder(self.dsn.clone())
            .credentials(self.user.clone(), self.password.clone())
            .build()
    }
}

/// Set up, start and provision an embedded `PostgreSQL` instance with database `db_name`.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, the database cannot be
/// created, or the post-start connectivity check fails.
pub async fn setup_postgres_embedded(
    db_name: &str,
) -> Result<EmbeddedPostgres, Box<dyn Error + Send + Sync>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(db_name).await?;

    let settings = postgresql.settings();
    let port = settings.port;
    let embedded = EmbeddedPostgres {
        port,
        dsn: format!("pgsql:host={};port={port};dbname={db_name}", settings.host),
        user: settings.username.clone(),
        password: settings.password.clone(),
        postgresql,
    };

    let mut adapter = embedded.adapter()?;
    adapter.execute("SELECT 1", &[]).await?;
    tracing::info!(port, db_name, "embedded postgres ready");

    Ok(embedded)
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    if let Err(e) = postgresql.stop().await {
        tracing::warn!(error = %e, "failed to stop embedded postgres");
    }
}
