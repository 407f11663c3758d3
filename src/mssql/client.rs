use tiberius::{Client, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::{MssqlClient, MssqlOptions, build_tiberius_config};
use crate::error::SqlError;

/// Open a SQL Server connection.
///
/// Named instances are resolved through the SQL Browser service; a routing response from
/// the server (Azure SQL gateways) is followed once.
///
/// # Errors
/// Returns `SqlError` with SQLSTATE `08001` if the TCP connection or login fails, or the
/// server's mapped state if it rejected the login with an error token.
pub async fn create_mssql_client(opts: &MssqlOptions) -> Result<MssqlClient, SqlError> {
    let mut config = build_tiberius_config(opts);

    let tcp = if opts.instance_name.is_some() {
        TcpStream::connect_named(&config).await.map_err(connect_error)?
    } else {
        TcpStream::connect(config.get_addr())
            .await
            .map_err(SqlError::connect)?
    };
    tcp.set_nodelay(true).map_err(SqlError::connect)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            tracing::debug!(%host, port, "sql server redirected connection");
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(SqlError::connect)?;
            tcp.set_nodelay(true).map_err(SqlError::connect)?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(connect_error)
        }
        Err(e) => Err(connect_error(e)),
    }
}

fn connect_error(err: tiberius::error::Error) -> SqlError {
    match err {
        tiberius::error::Error::Server(_) => SqlError::from(err),
        other => SqlError::connect(other),
    }
}
