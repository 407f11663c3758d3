#![cfg(feature = "sqlite")]

use sql_adapter::GENERIC_ERROR_CODE;
use sql_adapter::prelude::*;

async fn counters() -> Result<SqlAdapter, SqlError> {
    let mut db = SqlAdapter::new("sqlite::memory:", None, None)?;
    db.execute(
        "CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT, x INTEGER NOT NULL UNIQUE)",
        &[],
    )
    .await?;
    Ok(db)
}

#[tokio::test]
async fn insert_reports_affected_rows_and_id() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;

    let affected = db
        .execute("INSERT INTO counters (x) VALUES (?)", &[RowValues::Int(5)])
        .await?;
    assert_eq!(affected, 1);
    assert_eq!(db.affected_rows(), 1);
    assert!(db.last_insert_id().await? > 0);

    db.execute("INSERT INTO counters (x) VALUES (?)", &[RowValues::Int(6)])
        .await?;
    let updated = db.execute("UPDATE counters SET x = x + 10", &[]).await?;
    assert_eq!(updated, 2);
    assert_eq!(db.affected_rows(), 2);
    assert_eq!(db.last_insert_id().await?, 2);
    Ok(())
}

#[tokio::test]
async fn execute_with_a_select_reports_zero() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;
    db.execute("INSERT INTO counters (x) VALUES (1), (2)", &[]).await?;

    let affected = db.execute("SELECT x FROM counters", &[]).await?;
    assert_eq!(affected, 0);
    Ok(())
}

#[tokio::test]
async fn execute_with_returning_counts_changed_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;

    let affected = db
        .execute(
            "INSERT INTO counters (x) VALUES (?1) RETURNING id",
            &[RowValues::Int(5)],
        )
        .await?;
    assert_eq!(affected, 1);
    assert_eq!(db.affected_rows(), 1);

    db.execute("INSERT INTO counters (x) VALUES (6), (7)", &[]).await?;
    let updated = db
        .execute("UPDATE counters SET x = x + 10 WHERE x > 5 RETURNING id", &[])
        .await?;
    assert_eq!(updated, 2);

    // The previous write's count must not leak into a read.
    let affected = db.execute("SELECT x FROM counters", &[]).await?;
    assert_eq!(affected, 0);
    assert_eq!(
        db.get_cell("SELECT COUNT(*) FROM counters", &[]).await?,
        Some(RowValues::Int(3))
    );
    Ok(())
}

#[tokio::test]
async fn failing_execute_and_query_share_a_sqlstate() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;
    let sql = "INSERT INTO missing_table (x) VALUES (1)";

    let exec_err = db.execute(sql, &[]).await.unwrap_err();
    let query_err = db.query(sql, &[]).await.unwrap_err();

    assert_eq!(exec_err.sql_state(), query_err.sql_state());
    assert_eq!(exec_err.sql_state(), sqlstate::GENERAL_ERROR);
    assert_eq!(exec_err.code(), GENERIC_ERROR_CODE);
    assert!(exec_err.message().contains("missing_table"));
    assert!(std::error::Error::source(&exec_err).is_some());
    Ok(())
}

#[tokio::test]
async fn constraint_violations_map_to_integrity_state() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;
    db.execute("INSERT INTO counters (x) VALUES (1)", &[]).await?;

    let err = db
        .execute("INSERT INTO counters (x) VALUES (1)", &[])
        .await
        .unwrap_err();
    assert_eq!(err.sql_state(), sqlstate::INTEGRITY_CONSTRAINT_VIOLATION);
    // SQLITE_CONSTRAINT_UNIQUE
    assert_eq!(err.driver_code(), Some(2067));

    let err = db
        .execute("INSERT INTO counters (x) VALUES (NULL)", &[])
        .await
        .unwrap_err();
    assert_eq!(err.sql_state(), sqlstate::INTEGRITY_CONSTRAINT_VIOLATION);
    Ok(())
}

#[tokio::test]
async fn wrong_parameter_count() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;

    let err = db
        .execute(
            "INSERT INTO counters (x) VALUES (?)",
            &[RowValues::Int(1), RowValues::Int(2)],
        )
        .await
        .unwrap_err();
    assert_eq!(err.sql_state(), sqlstate::INVALID_PARAMETER_NUMBER);
    Ok(())
}

#[tokio::test]
async fn error_introspection_follows_the_last_operation() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = counters().await?;
    assert_eq!(db.error_no(), "00000");
    assert_eq!(db.error_message(), "");
    assert!(db.last_error().is_none());

    let err = db.query("SELEC 1", &[]).await.unwrap_err();
    assert_eq!(db.error_no(), err.sql_state());
    assert_eq!(db.error_message(), err.message());
    let last = db.last_error().expect("error recorded");
    assert_eq!(last.driver_code(), err.driver_code());
    assert_eq!(last.sql_state(), sqlstate::GENERAL_ERROR);

    // Accessors do not clear the snapshot.
    assert_eq!(db.affected_rows(), 0);
    assert_eq!(db.error_no(), sqlstate::GENERAL_ERROR);

    db.query("SELECT 1", &[]).await?;
    assert_eq!(db.error_no(), "00000");
    assert_eq!(db.error_message(), "");
    Ok(())
}
