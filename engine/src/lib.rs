//! 多引擎查询网关
//!
//! Runs report queries and catalog introspection against whichever engine a
//! [`ConnectionProfile`](common::models::ConnectionProfile) names. Every call
//! opens its own connection, runs one statement and closes the connection on
//! every exit path; there is no pooling and no shared state between calls.
//!
//! - [`QueryGateway`]: the four caller-facing operations
//! - [`session`]: engine dispatch over the closed [`DbType`](common::models::DbType) set
//! - [`drivers`]: per-engine connect, bind and row decoding
//! - [`catalog`]: per-engine table listing and column introspection
//! - [`sample`]: seeds the demo sqlite database

pub mod catalog;
pub mod drivers;
pub mod error;
pub mod gateway;
pub mod sample;
pub mod session;

pub use error::{DriverError, GatewayError, GatewayResult};
pub use gateway::{ConnectionCheck, QueryGateway};
pub use session::{Connector, DriverConnector, DriverSession, RowSet, Session};
