//! Shared data models for all microservices.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{ConnectionItem, ConnectionProfile, CreateConnectionRequest, DbType};
pub use query::{ColumnDescriptor, ExportRequest, QueryRequest, QueryResult, Row, TableSchema};
