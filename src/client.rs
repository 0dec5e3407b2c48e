//! Session facade.
//!
//! `Client` is the composition root: it owns the session registry and wires
//! the connection manager, execution engine and cursor manager to it. One
//! `Client` means one remote connection and at most one open cursor.

use crate::config::SessionConfig;
use crate::connection::{ConnectionManager, Session, SessionRegistry};
use crate::driver::Driver;
use crate::error::SessionError;
use crate::query::{
    Argument, AsyncOutcome, CancelHandle, ColumnDescriptor, Cursor, CursorManager, ExecOutcome,
    ExecutionEngine, ResultSet, Row,
};
use std::sync::Arc;
use tracing::warn;

/// Single-connection database session.
///
/// # Example
///
/// ```no_run
/// # use warehouse_session::{Client, SessionConfig};
/// # use warehouse_session::driver::Driver;
/// # use std::sync::Arc;
/// # async fn example(driver: Arc<dyn Driver>) -> Result<(), warehouse_session::SessionError> {
/// let client = Client::new(driver, SessionConfig::default());
/// client.open("user:pass@account/DB/PUBLIC?warehouse=WH").await?;
///
/// let outcome = client.execute("DELETE FROM t WHERE id = ?", &[42_i64.into()]).await?;
/// println!("Deleted {} rows", outcome.rows_affected_or_zero());
///
/// let results = client.fetch_all("SELECT a, b FROM t", &[]).await?;
/// println!("{} rows", results.row_count());
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    registry: Arc<SessionRegistry>,
    connections: ConnectionManager,
    engine: ExecutionEngine,
    cursors: CursorManager,
}

impl Client {
    /// Create a client over a driver. No connection is made until [`Client::open`].
    pub fn new(driver: Arc<dyn Driver>, config: SessionConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        Self {
            engine: ExecutionEngine::new(Arc::clone(&registry), &config),
            cursors: CursorManager::new(Arc::clone(&registry), &config),
            connections: ConnectionManager::new(driver, Arc::clone(&registry), config),
            registry,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        self.connections.config()
    }

    /// The shared session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Open the session, replacing any existing one.
    ///
    /// A cursor left open on the previous session is closed first; a failure to
    /// close it is logged and does not stop the re-open.
    pub async fn open(&self, descriptor: &str) -> Result<Arc<Session>, SessionError> {
        if let Err(e) = self.cursors.close().await {
            warn!(error = %e, "Failed to close cursor before re-opening session");
        }
        Ok(self.connections.open(descriptor).await?)
    }

    /// Health check on the current session.
    pub async fn ping(&self) -> Result<(), SessionError> {
        Ok(self.connections.ping().await?)
    }

    /// Close the current cursor, then the session.
    ///
    /// A failure to close the cursor is logged and does not stop the
    /// connection from closing.
    pub async fn close(&self) -> Result<(), SessionError> {
        if let Err(e) = self.cursors.close().await {
            warn!(error = %e, "Failed to close cursor before closing session");
        }
        Ok(self.connections.close().await?)
    }

    /// Run a statement to completion.
    pub async fn execute(&self, sql: &str, args: &[Argument]) -> Result<ExecOutcome, SessionError> {
        Ok(self.engine.execute(sql, args).await?)
    }

    /// Dispatch a statement and return its remote tracking identifier.
    pub async fn execute_async(
        &self,
        sql: &str,
        args: &[Argument],
    ) -> Result<AsyncOutcome, SessionError> {
        Ok(self.engine.execute_async(sql, args).await?)
    }

    /// Cancel the in-flight blocking execution.
    pub fn cancel_execution(&self) -> bool {
        self.engine.cancel()
    }

    /// Open a cursor over a row-returning statement, closing the current one.
    pub async fn fetch(&self, sql: &str, args: &[Argument]) -> Result<Arc<Cursor>, SessionError> {
        Ok(self.cursors.open(sql, args).await?)
    }

    /// Next row of the current cursor; `None` once exhausted.
    pub async fn next_row(&self) -> Result<Option<Row>, SessionError> {
        Ok(self.cursors.advance().await?)
    }

    /// Column names of the current cursor.
    pub fn columns(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.cursors.columns()?)
    }

    /// Column type descriptors of the current cursor.
    pub fn column_types(&self) -> Result<Vec<ColumnDescriptor>, SessionError> {
        Ok(self.cursors.column_types()?)
    }

    /// Close the current cursor. Idempotent.
    pub async fn close_cursor(&self) -> Result<(), SessionError> {
        Ok(self.cursors.close().await?)
    }

    /// Check if a cursor is open.
    pub fn is_cursor_open(&self) -> bool {
        self.cursors.is_open()
    }

    /// Cancel the in-flight cursor open.
    pub fn cancel_fetch(&self) -> bool {
        self.cursors.cancel()
    }

    /// Handles for the execution and fetch cancellation slots, in that order.
    pub fn cancel_handles(&self) -> Vec<CancelHandle> {
        vec![self.engine.cancel_handle(), self.cursors.cancel_handle()]
    }

    /// Open a cursor, drain every row and close it.
    pub async fn fetch_all(&self, sql: &str, args: &[Argument]) -> Result<ResultSet, SessionError> {
        let cursor = self.cursors.open(sql, args).await?;
        let columns = cursor.column_types().to_vec();

        let mut rows = Vec::new();
        let drained = loop {
            match self.cursors.advance().await {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        let closed = self.cursors.close().await;
        drained?;
        closed?;

        Ok(ResultSet { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ConnectConfig, DriverConnection, DriverError};
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl Driver for Offline {
        async fn connect(
            &self,
            _config: &ConnectConfig,
        ) -> Result<Box<dyn DriverConnection>, DriverError> {
            Err(DriverError::Io("no route to host".to_string()))
        }
    }

    fn client() -> Client {
        Client::new(Arc::new(Offline), SessionConfig::default())
    }

    #[tokio::test]
    async fn test_operations_before_open() {
        let client = client();

        let err = client.execute("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "database connection not initialized");

        let err = client.fetch("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "database connection not initialized");

        let err = client.next_row().await.unwrap_err();
        assert_eq!(err.to_string(), "no cursor available");

        assert!(client.close().await.is_ok());
        assert!(!client.is_cursor_open());
    }

    #[test]
    fn test_cancel_handles_without_inflight_work() {
        let client = client();
        let handles = client.cancel_handles();
        assert_eq!(handles.len(), 2);
        assert!(handles.iter().all(|h| !h.cancel()));
        assert!(!client.cancel_execution());
        assert!(!client.cancel_fetch());
    }

    #[tokio::test]
    async fn test_open_failure_renders_cause() {
        let client = client();
        let err = client.open("user:pw@account/db").await.unwrap_err();
        let rendered = err.render();
        assert!(rendered.contains("Failed to connect"));
        assert!(rendered.contains("no route to host"));
        assert!(!client.registry().is_initialized().await);
    }
}
