//! Driver abstraction traits.
//!
//! This module defines the seam between the session layer and the database
//! driver. The driver owns the wire protocol, authentication handshakes and
//! transport; the session layer only sees these traits.

use crate::connection::auth::Authenticator;
use crate::error::DriverError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::messages::{ColumnType, Parameter, Value};

/// Everything a driver needs to establish a connection.
#[derive(Clone)]
pub struct ConnectConfig {
    /// Descriptor text, already rebuilt for the chosen authentication mode
    pub descriptor: String,
    /// Authentication mode
    pub authenticator: Authenticator,
    /// Client name reported to the remote system
    pub client_name: String,
    /// Client version reported to the remote system
    pub client_version: String,
}

// The descriptor may embed a password, so it never reaches debug output
impl std::fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("descriptor", &"<redacted>")
            .field("authenticator", &self.authenticator)
            .field("client_name", &self.client_name)
            .field("client_version", &self.client_version)
            .finish()
    }
}

/// Execution mode signaled to the remote system at connection-context level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Wait for the statement to complete
    #[default]
    Blocking,
    /// Return as soon as the remote system has accepted the statement
    Async,
}

/// Database driver: a factory for connections.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a low-level connection.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the connection cannot be established.
    async fn connect(&self, config: &ConnectConfig)
        -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// An open low-level connection.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    /// Health check.
    async fn ping(&self) -> Result<(), DriverError>;

    /// Run a statement that does not stream rows.
    ///
    /// The driver must observe `cancel` and abort the remote statement when it
    /// fires; the returned future may also be dropped after cancellation.
    async fn execute(
        &self,
        sql: &str,
        params: &[Parameter],
        cancel: CancellationToken,
    ) -> Result<Box<dyn DriverExecResult>, DriverError>;

    /// Run a statement that streams rows.
    ///
    /// Cancellation follows the same contract as [`DriverConnection::execute`].
    async fn query(
        &self,
        sql: &str,
        params: &[Parameter],
        cancel: CancellationToken,
    ) -> Result<Box<dyn RowStream>, DriverError>;

    /// Prepare a statement under the given execution mode.
    async fn prepare(
        &self,
        sql: &str,
        mode: ExecMode,
    ) -> Result<Box<dyn DriverStatement>, DriverError>;

    /// Close the connection.
    async fn close(&self) -> Result<(), DriverError>;
}

/// Outcome of a completed write as reported by the driver.
///
/// Each accessor may fail independently of the statement itself.
pub trait DriverExecResult: Send {
    /// Identifier generated by the statement, if the driver supports it.
    fn last_insert_id(&self) -> Result<i64, DriverError>;

    /// Number of rows affected.
    fn rows_affected(&self) -> Result<i64, DriverError>;
}

/// A prepared statement handle.
#[async_trait]
pub trait DriverStatement: Send {
    /// Dispatch the statement with bound parameters.
    async fn execute(&mut self, params: &[Parameter]) -> Result<(), DriverError>;

    /// Whether this handle can report a tracking identifier at all.
    fn supports_query_id(&self) -> bool;

    /// Tracking identifier assigned by the remote system once `execute` returned.
    fn query_id(&self) -> String;

    /// Release the statement handle.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Pull-based stream over one result set.
#[async_trait]
pub trait RowStream: Send {
    /// Column names, in result order.
    fn columns(&self) -> Result<Vec<String>, DriverError>;

    /// Column type reports, in result order.
    fn column_types(&self) -> Result<Vec<ColumnType>, DriverError>;

    /// Move to the next row.
    ///
    /// Returns `Ok(false)` on ordinary exhaustion and `Err` when the stream
    /// itself failed.
    async fn advance(&mut self) -> Result<bool, DriverError>;

    /// Materialize the row the stream is positioned on.
    fn scan(&mut self) -> Result<Vec<Value>, DriverError>;

    /// Release the stream.
    async fn close(&mut self) -> Result<(), DriverError>;
}
