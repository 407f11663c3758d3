use std::time::Duration;

use tokio_postgres::Config as PgConfig;
use tokio_postgres::config::SslMode;

use crate::config::{ConnectionDescriptor, key_value_pairs};
use crate::error::SqlError;

/// Build a `tokio_postgres::Config` from a `pgsql:` descriptor.
///
/// Recognised keys: `host`, `port`, `dbname`, `user`, `password`, `application_name`,
/// `connect_timeout` (seconds) and `sslmode` (`disable`, `allow` or `prefer`; connections
/// are made without TLS). Explicit credentials on the descriptor override DSN keys.
///
/// # Errors
/// Returns `SqlError` (`IM002`) for unknown keys, unparsable values, or a missing `dbname`
/// or `user`.
pub fn build_config(desc: &ConnectionDescriptor) -> Result<PgConfig, SqlError> {
    let mut config = PgConfig::new();

    for (key, value) in key_value_pairs(desc.target())? {
        match key.as_str() {
            "host" => {
                config.host(&value);
            }
            "port" => {
                let port: u16 = value
                    .parse()
                    .map_err(|_| SqlError::config(format!("invalid port: {value}")))?;
                config.port(port);
            }
            "dbname" => {
                config.dbname(&value);
            }
            "user" => {
                config.user(&value);
            }
            "password" => {
                config.password(&value);
            }
            "application_name" => {
                config.application_name(&value);
            }
            "connect_timeout" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| SqlError::config(format!("invalid connect_timeout: {value}")))?;
                config.connect_timeout(Duration::from_secs(secs));
            }
            "sslmode" => {
                let mode = match value.as_str() {
                    "disable" => SslMode::Disable,
                    "allow" | "prefer" => SslMode::Prefer,
                    other => {
                        return Err(SqlError::config(format!(
                            "unsupported sslmode (TLS is not available): {other}"
                        )));
                    }
                };
                config.ssl_mode(mode);
            }
            other => {
                return Err(SqlError::config(format!("unsupported pgsql DSN key: {other}")));
            }
        }
    }

    if let Some(user) = desc.user() {
        config.user(user);
    }
    if let Some(password) = desc.password() {
        config.password(password);
    }
    if config.get_hosts().is_empty() {
        config.host("localhost");
    }

    if config.get_dbname().is_none() {
        return Err(SqlError::config("dbname is required"));
    }
    if config.get_user().is_none() {
        return Err(SqlError::config("user is required"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(dsn: &str, user: Option<&str>) -> ConnectionDescriptor {
        ConnectionDescriptor::parse(dsn, user.map(str::to_string), Some("secret".into())).unwrap()
    }

    #[test]
    fn keys_map_onto_tokio_postgres_config() {
        let cfg = build_config(&descriptor(
            "pgsql:host=db.internal;port=6432;dbname=app;application_name=svc;connect_timeout=3",
            Some("svc"),
        ))
        .unwrap();
        assert_eq!(cfg.get_ports(), &[6432]);
        assert_eq!(cfg.get_dbname(), Some("app"));
        assert_eq!(cfg.get_user(), Some("svc"));
        assert_eq!(cfg.get_application_name(), Some("svc"));
        assert_eq!(cfg.get_connect_timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(cfg.get_password(), Some("secret".as_bytes()));
    }

    #[test]
    fn explicit_user_overrides_dsn_user() {
        let cfg = build_config(&descriptor("pgsql:dbname=app;user=from_dsn", Some("explicit")))
            .unwrap();
        assert_eq!(cfg.get_user(), Some("explicit"));
        assert_eq!(cfg.get_hosts().len(), 1);
    }

    #[test]
    fn missing_required_keys_and_bad_values() {
        assert!(build_config(&descriptor("pgsql:host=db", Some("u"))).is_err());
        assert!(build_config(&descriptor("pgsql:dbname=app", None)).is_err());
        assert!(build_config(&descriptor("pgsql:dbname=app;port=x", Some("u"))).is_err());
        let err = build_config(&descriptor("pgsql:dbname=app;charset=utf8", Some("u"))).unwrap_err();
        assert!(err.message().contains("charset"));
        assert!(build_config(&descriptor("pgsql:dbname=app;sslmode=require", Some("u"))).is_err());
    }
}
