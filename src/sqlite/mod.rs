// SQLite backend
//
// - config: opening the database file and connection-level pragmas
// - params: RowValues -> rusqlite values
// - query: statement execution and result extraction
// - connection: the native handle the adapter drives, run on tokio's blocking pool

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::{SharedSqliteConnection, SqliteConnection};
pub use params::Params;
pub use query::build_result_set;
