#![cfg(feature = "test-utils-postgres")]

use sql_adapter::prelude::*;
use sql_adapter::test_utils::{setup_postgres_embedded, stop_postgres_embedded};

#[tokio::test(flavor = "multi_thread")]
async fn postgres_driver_contract() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let pg = setup_postgres_embedded("adapter_test").await?;
    let mut db = pg.adapter()?;

    assert_eq!(db.database_type().await?, DatabaseType::Postgres);
    assert!(!db.database_version().await?.is_empty());
    assert!(!db.prepare_options().cache_statements);

    db.execute(
        "CREATE TABLE items (id SERIAL PRIMARY KEY, name TEXT NOT NULL UNIQUE, qty INT4, price FLOAT8)",
        &[],
    )
    .await?;

    let affected = db
        .execute(
            "INSERT INTO items (name, qty, price) VALUES ($1, $2, $3)",
            &[
                RowValues::Text("bolt".into()),
                RowValues::Int(5),
                RowValues::Float(0.25),
            ],
        )
        .await?;
    assert_eq!(affected, 1);
    assert!(db.last_insert_id().await? > 0);

    let row = db
        .get_row("SELECT name, qty, price FROM items WHERE name = $1", &["bolt".into()])
        .await?
        .expect("inserted row");
    assert_eq!(row.get("qty"), Some(&RowValues::Int(5)));
    assert_eq!(row.get("price"), Some(&RowValues::Float(0.25)));

    // Statements without columns still run and come back empty.
    let rs = db.query("UPDATE items SET qty = qty + 1", &[]).await?;
    assert!(rs.is_empty());
    assert!(db.raw_result().is_none());

    let exec_err = db
        .execute("INSERT INTO items (name) VALUES ('bolt')", &[])
        .await
        .unwrap_err();
    let query_err = db
        .query("INSERT INTO items (name) VALUES ('bolt')", &[])
        .await
        .unwrap_err();
    assert_eq!(exec_err.sql_state(), "23505");
    assert_eq!(exec_err.sql_state(), query_err.sql_state());
    assert_eq!(db.error_no(), "23505");

    db.start_transaction().await?;
    db.execute("INSERT INTO items (name) VALUES ('nut')", &[]).await?;
    db.rollback().await?;
    assert_eq!(
        db.get_col("SELECT name FROM items ORDER BY id", &[]).await?,
        vec![RowValues::Text("bolt".into())]
    );

    db.start_transaction().await?;
    db.execute("INSERT INTO items (name) VALUES ('washer')", &[]).await?;
    db.commit().await?;
    assert_eq!(
        db.get_cell("SELECT COUNT(*) FROM items", &[]).await?,
        Some(RowValues::Int(2))
    );

    let err = db.commit().await.unwrap_err();
    assert_eq!(err.sql_state(), sqlstate::INVALID_TRANSACTION_STATE);

    assert_eq!(db.escape("O'Brien").await?, "O''Brien");

    // Types outside the common scalar set still read back.
    assert_eq!(
        db.get_cell("SELECT 1.5::numeric", &[]).await?,
        Some(RowValues::Float(1.5))
    );
    assert_eq!(
        db.get_cell("SELECT avg(qty) FROM (VALUES (1), (2)) AS v(qty)", &[])
            .await?,
        Some(RowValues::Float(1.5))
    );
    let uuid = db.get_cell("SELECT gen_random_uuid()", &[]).await?;
    assert!(matches!(uuid, Some(RowValues::Text(ref s)) if s.len() == 36));
    assert_eq!(
        db.get_cell("SELECT '10:30:00'::time", &[]).await?,
        Some(RowValues::Text("10:30:00".into()))
    );

    db.execute("CREATE TYPE mood AS ENUM ('happy', 'sad')", &[])
        .await?;
    assert_eq!(
        db.get_cell("SELECT 'sad'::mood", &[]).await?,
        Some(RowValues::Text("sad".into()))
    );
    let row = db
        .get_row("SELECT interval '1 day' AS span, 2 AS n", &[])
        .await?
        .expect("one row");
    assert!(matches!(row.get("span"), Some(RowValues::Blob(_))));
    assert_eq!(row.get("n"), Some(&RowValues::Int(2)));

    drop(db);
    stop_postgres_embedded(pg).await;
    Ok(())
}
