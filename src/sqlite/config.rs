use rusqlite::Connection;

use crate::error::SqlError;

/// DSN body that selects a private in-memory database.
pub const MEMORY_TARGET: &str = ":memory:";

/// Open the database named by a `sqlite:` DSN body and apply connection pragmas.
///
/// Blocking; callers run it on the blocking pool.
///
/// # Errors
/// Returns `SqlError` if the file cannot be opened or the pragmas fail.
pub fn open(target: &str) -> Result<Connection, SqlError> {
    let conn = if target.is_empty() || target == MEMORY_TARGET {
        Connection::open_in_memory()?
    } else {
        Connection::open(target)?
    };
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Text encoding for new databases. Existing files keep the encoding they were created with.
///
/// # Errors
/// Returns `SqlError` if the PRAGMA cannot be executed.
pub fn apply_pragmas(conn: &Connection) -> Result<(), SqlError> {
    conn.execute_batch("PRAGMA encoding = 'UTF-8';")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_target_opens_utf8_database() {
        let conn = open(MEMORY_TARGET).unwrap();
        let encoding: String = conn
            .query_row("PRAGMA encoding", [], |row| row.get(0))
            .unwrap();
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let err = open("/definitely/not/a/dir/db.sqlite").unwrap_err();
        // SQLITE_CANTOPEN
        assert_eq!(err.driver_code(), Some(14));
    }
}
