use tiberius::{AuthMethod, Config as TiberiusConfig};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::config::{ConnectionDescriptor, key_value_pairs};
use crate::error::SqlError;

/// Type alias for SQL Server client
pub type MssqlClient = tiberius::Client<Compat<TcpStream>>;

const DEFAULT_PORT: u16 = 1433;

/// Options for one SQL Server connection.
#[derive(Clone, PartialEq, Eq)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: Option<u16>,
    pub instance_name: Option<String>,
}

impl MssqlOptions {
    /// Collect options from a `sqlsrv:` descriptor.
    ///
    /// The body is `Server=host[,port][\instance];Database=name`. Credentials come from the
    /// descriptor and are required.
    ///
    /// # Errors
    /// Returns `SqlError` (`IM002`) for unknown keys, a bad port, or missing values.
    pub fn from_descriptor(desc: &ConnectionDescriptor) -> Result<Self, SqlError> {
        let mut server = None;
        let mut database = None;

        for (key, value) in key_value_pairs(desc.target())? {
            match key.as_str() {
                "server" => server = Some(value),
                "database" => database = Some(value),
                other => {
                    return Err(SqlError::config(format!("unsupported sqlsrv DSN key: {other}")));
                }
            }
        }

        let server = server.ok_or_else(|| SqlError::config("Server is required"))?;
        let (host, port, instance_name) = parse_server(&server)?;

        Ok(Self {
            server: host,
            database: database.ok_or_else(|| SqlError::config("Database is required"))?,
            user: desc
                .user()
                .ok_or_else(|| SqlError::config("user is required"))?
                .to_string(),
            password: desc.password().unwrap_or_default().to_string(),
            port,
            instance_name,
        })
    }
}

impl std::fmt::Debug for MssqlOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlOptions")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("port", &self.port)
            .field("instance_name", &self.instance_name)
            .finish_non_exhaustive()
    }
}

/// Split `host[,port][\instance]`; the port may also follow the instance name.
fn parse_server(value: &str) -> Result<(String, Option<u16>, Option<String>), SqlError> {
    let (address, instance) = match value.split_once('\\') {
        Some((address, instance)) => (address, Some(instance)),
        None => (value, None),
    };

    let mut port = None;
    let mut split_port = |part: &str| -> Result<String, SqlError> {
        match part.split_once(',') {
            Some((name, p)) => {
                let parsed = p
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| SqlError::config(format!("invalid port: {p}")))?;
                port = Some(parsed);
                Ok(name.trim().to_string())
            }
            None => Ok(part.trim().to_string()),
        }
    };

    let host = split_port(address)?;
    let instance = instance.map(&mut split_port).transpose()?;

    if host.is_empty() {
        return Err(SqlError::config("Server is required"));
    }
    Ok((host, port, instance.filter(|i| !i.is_empty())))
}

pub(crate) fn build_tiberius_config(opts: &MssqlOptions) -> TiberiusConfig {
    let mut config = TiberiusConfig::new();
    config.host(&opts.server);
    config.database(&opts.database);
    config.port(opts.port.unwrap_or(DEFAULT_PORT));
    config.authentication(AuthMethod::sql_server(&opts.user, &opts.password));
    if let Some(instance) = &opts.instance_name {
        config.instance_name(instance);
    }
    config.trust_cert();
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dsn: &str) -> Result<MssqlOptions, SqlError> {
        let desc = ConnectionDescriptor::parse(dsn, Some("sa".into()), Some("pw".into()))?;
        MssqlOptions::from_descriptor(&desc)
    }

    #[test]
    fn server_with_port_and_instance() {
        let opts = options(r"sqlsrv:Server=db.local,1444\SQLEXPRESS;Database=app").unwrap();
        assert_eq!(opts.server, "db.local");
        assert_eq!(opts.port, Some(1444));
        assert_eq!(opts.instance_name.as_deref(), Some("SQLEXPRESS"));
        assert_eq!(opts.database, "app");
        assert_eq!(opts.user, "sa");
    }

    #[test]
    fn port_defaults_when_absent() {
        let opts = options("mssql:Server=db;Database=app").unwrap();
        assert_eq!(opts.port, None);
        assert_eq!(build_tiberius_config(&opts).get_addr(), "db:1433");
    }

    #[test]
    fn rejects_bad_bodies() {
        assert!(options("sqlsrv:Database=app").is_err());
        assert!(options("sqlsrv:Server=db").is_err());
        assert!(options("sqlsrv:Server=db,abc;Database=app").is_err());
        let err = options("sqlsrv:Server=db;Database=app;Encrypt=yes").unwrap_err();
        assert_eq!(err.sql_state(), "IM002");
    }
}
