// PostgreSQL backend
//
// - config: pgsql DSN body -> tokio_postgres::Config
// - params: RowValues as tokio_postgres parameters
// - query: result extraction and building
// - connection: the native handle the adapter drives

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
pub use params::Params;
pub use query::build_result_set_from_statement;
