//! Driver boundary for remote database access.
//!
//! The driver itself (wire protocol, authentication handshakes, transport) is
//! supplied by the embedding application. This module defines what the session
//! layer expects from it:
//! - `protocol` - the `Driver`, `DriverConnection`, `DriverStatement` and `RowStream` traits
//! - `messages` - parameter, value and column type types

pub mod messages;
pub mod protocol;

pub use messages::{ColumnType, Parameter, Value};
pub use protocol::{
    ConnectConfig, Driver, DriverConnection, DriverExecResult, DriverStatement, ExecMode,
    RowStream,
};

pub use crate::error::DriverError;
