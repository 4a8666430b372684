//! 报表查询微服务公共模块
//!
//! Shared building blocks for connection-service and query-service:
//! configuration, the HTTP error type, the response envelope, models,
//! middleware and validation helpers.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
