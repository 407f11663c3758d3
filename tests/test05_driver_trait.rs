#![cfg(feature = "sqlite")]

use std::sync::Arc;

use async_trait::async_trait;
use sql_adapter::prelude::*;

/// Canned driver standing in for a database in caller tests.
struct FakeDriver {
    rows: ResultSet,
    executed: Vec<String>,
}

impl FakeDriver {
    fn with_users() -> Self {
        let mut rows = ResultSet::default();
        rows.set_column_names(Arc::new(vec!["id".into(), "name".into()]));
        rows.add_row_values(vec![RowValues::Int(1), RowValues::Text("ada".into())]);
        rows.add_row_values(vec![RowValues::Int(2), RowValues::Text("brian".into())]);
        Self {
            rows,
            executed: Vec::new(),
        }
    }
}

#[async_trait]
impl SqlDriver for FakeDriver {
    async fn connect(&mut self) -> Result<(), SqlError> {
        Ok(())
    }

    async fn query(&mut self, sql: &str, _params: &[RowValues]) -> Result<ResultSet, SqlError> {
        self.executed.push(sql.to_string());
        if sql.contains("nothing") {
            return Ok(ResultSet::default());
        }
        Ok(self.rows.clone())
    }

    async fn execute(&mut self, sql: &str, _params: &[RowValues]) -> Result<usize, SqlError> {
        self.executed.push(sql.to_string());
        Ok(1)
    }

    fn error_no(&self) -> &str {
        sqlstate::SUCCESS
    }

    fn error_message(&self) -> &str {
        ""
    }

    async fn escape(&mut self, value: &str) -> Result<String, SqlError> {
        Ok(value.replace('\'', "''"))
    }

    async fn last_insert_id(&mut self) -> Result<i64, SqlError> {
        Ok(3)
    }

    fn affected_rows(&self) -> usize {
        1
    }

    async fn set_debug_mode(&mut self, _enabled: bool) -> Result<(), SqlError> {
        Ok(())
    }

    fn raw_result(&self) -> Option<&ResultSet> {
        Some(&self.rows)
    }

    async fn start_transaction(&mut self) -> Result<(), SqlError> {
        Err(SqlError::transaction_state("fake drivers do not do transactions"))
    }

    async fn commit(&mut self) -> Result<(), SqlError> {
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SqlError> {
        Ok(())
    }

    async fn database_type(&mut self) -> Result<DatabaseType, SqlError> {
        Ok(DatabaseType::Sqlite)
    }

    async fn database_version(&mut self) -> Result<String, SqlError> {
        Ok("fake".into())
    }
}

/// Code written against the contract, not a concrete engine.
async fn user_names<D: SqlDriver + ?Sized>(db: &mut D) -> Result<Vec<String>, SqlError> {
    Ok(db
        .get_col("SELECT name FROM users ORDER BY id", &[])
        .await?
        .into_iter()
        .filter_map(|v| v.as_text().map(str::to_string))
        .collect())
}

#[tokio::test]
async fn default_shaping_methods_reduce_query() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeDriver::with_users();

    assert_eq!(
        fake.get_col("SELECT id FROM users", &[]).await?,
        vec![RowValues::Int(1), RowValues::Int(2)]
    );
    let row = fake.get_row("SELECT * FROM users", &[]).await?.expect("row");
    assert_eq!(row.get("name"), Some(&RowValues::Text("ada".into())));
    assert_eq!(
        fake.get_cell("SELECT id FROM users", &[]).await?,
        Some(RowValues::Int(1))
    );

    assert!(fake.get_col("SELECT nothing", &[]).await?.is_empty());
    assert!(fake.get_row("SELECT nothing", &[]).await?.is_none());
    assert!(fake.get_cell("SELECT nothing", &[]).await?.is_none());
    assert_eq!(fake.executed.len(), 6);
    Ok(())
}

#[tokio::test]
async fn callers_can_take_any_driver() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeDriver::with_users();
    assert_eq!(user_names(&mut fake).await?, ["ada", "brian"]);

    let mut boxed: Box<dyn SqlDriver> = Box::new(FakeDriver::with_users());
    assert_eq!(user_names(boxed.as_mut()).await?, ["ada", "brian"]);
    Ok(())
}

#[tokio::test]
async fn adapter_and_fake_agree() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = SqlAdapter::new("sqlite::memory:", None, None)?;
    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .await?;
    db.execute("INSERT INTO users (name) VALUES ('ada'), ('brian')", &[])
        .await?;

    let mut drivers: Vec<Box<dyn SqlDriver>> =
        vec![Box::new(db), Box::new(FakeDriver::with_users())];
    for driver in &mut drivers {
        assert_eq!(user_names(driver.as_mut()).await?, ["ada", "brian"]);
    }
    Ok(())
}
