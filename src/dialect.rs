use crate::types::DatabaseType;

/// Options applied when statements are prepared on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrepareOptions {
    /// Keep prepared statements on the connection, keyed by SQL text, and reuse them.
    /// When `false` every call prepares a fresh statement that is released when the call
    /// returns.
    pub cache_statements: bool,
}

impl PrepareOptions {
    #[must_use]
    pub fn cached() -> Self {
        Self {
            cache_statements: true,
        }
    }

    #[must_use]
    pub fn uncached() -> Self {
        Self {
            cache_statements: false,
        }
    }
}

/// Per-engine prepare options; read once when a connection is opened or adopted.
///
/// `PostgreSQL` keeps no named statements alive between calls so connections stay usable
/// behind transaction-pooling proxies. `SQLite` reuses statements from the connection's
/// cache. SQL Server always goes through `sp_executesql`, so there is nothing to cache.
#[must_use]
pub fn prepare_options(engine: DatabaseType) -> PrepareOptions {
    match engine {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => PrepareOptions::uncached(),
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => PrepareOptions::cached(),
        #[cfg(feature = "mssql")]
        DatabaseType::Mssql => PrepareOptions::uncached(),
    }
}

/// Options a connection is actually opened with: a requested override where the engine
/// honours one, else the engine's default. SQL Server ignores overrides.
#[must_use]
pub fn effective_options(engine: DatabaseType, requested: Option<PrepareOptions>) -> PrepareOptions {
    match engine {
        #[cfg(feature = "mssql")]
        DatabaseType::Mssql => prepare_options(engine),
        #[allow(unreachable_patterns)]
        _ => requested.unwrap_or_else(|| prepare_options(engine)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_disables_statement_reuse() {
        assert!(!prepare_options(DatabaseType::Postgres).cache_statements);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_uses_statement_cache() {
        assert!(prepare_options(DatabaseType::Sqlite).cache_statements);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn overrides_apply_where_supported() {
        assert_eq!(
            effective_options(DatabaseType::Sqlite, Some(PrepareOptions::uncached())),
            PrepareOptions::uncached()
        );
        assert_eq!(
            effective_options(DatabaseType::Sqlite, None),
            PrepareOptions::cached()
        );
    }

    #[cfg(feature = "mssql")]
    #[test]
    fn mssql_ignores_overrides() {
        assert_eq!(
            effective_options(DatabaseType::Mssql, Some(PrepareOptions::cached())),
            PrepareOptions::uncached()
        );
    }
}
