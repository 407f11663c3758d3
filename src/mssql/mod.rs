// SQL Server backend (tiberius)
//
// - config: sqlsrv DSN body -> MssqlOptions -> tiberius::Config
// - client: TCP/named-instance connection setup
// - params: RowValues bound onto a tiberius Query
// - query: result extraction and building
// - connection: the native handle the adapter drives

pub mod client;
pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use client::create_mssql_client;
pub use config::{MssqlClient, MssqlOptions};
pub use connection::MssqlConnection;
pub use params::bind_query_params;
pub use query::build_result_set;
