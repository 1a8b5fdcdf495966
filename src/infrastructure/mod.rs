pub mod database;

pub use database::{
    ConnectionState, Connector, Database, DatabaseError, Endpoint, RetryPolicy, Session,
    TcpConnector,
};
