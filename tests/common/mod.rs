//! Common test utilities for warehouse-session integration tests.
//!
//! The tests run against `MockDriver`, an in-memory driver whose behaviour is
//! scripted through a shared [`MockState`]. Every test builds its own driver,
//! so tests can run in parallel.
//!
//! ```ignore
//! let driver = MockDriver::new();
//! driver.state().rows_affected = Ok(3);
//! let client = driver.client();
//! client.open(DESCRIPTOR).await?;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use warehouse_session::driver::{
    ColumnType, ConnectConfig, Driver, DriverConnection, DriverError, DriverExecResult,
    DriverStatement, ExecMode, Parameter, RowStream, Value,
};
use warehouse_session::{Client, SessionConfig};

// ============================================================================
// Descriptors
// ============================================================================

/// A valid password-based descriptor.
pub const DESCRIPTOR: &str = "user:secret@account/DB/PUBLIC?warehouse=WH";

/// A second valid descriptor, for re-open scenarios.
pub const OTHER_DESCRIPTOR: &str = "other:secret@account/DB2/PUBLIC?warehouse=WH";

/// Long enough to only ever finish through cancellation.
pub const FOREVER: Duration = Duration::from_secs(3600);

// ============================================================================
// Scripted state
// ============================================================================

/// Behaviour and observations shared between a test and its mock driver.
#[derive(Debug)]
pub struct MockState {
    // Failures to inject
    pub connect_error: Option<DriverError>,
    pub ping_error: Option<DriverError>,
    pub close_error: Option<DriverError>,
    pub exec_error: Option<DriverError>,
    pub query_error: Option<DriverError>,
    pub prepare_error: Option<DriverError>,
    pub statement_error: Option<DriverError>,
    pub stream_close_error: Option<DriverError>,
    pub metadata_error: Option<DriverError>,
    /// Fail `advance` after this many rows
    pub stream_error_after: Option<usize>,
    /// Fail `scan` on this row index
    pub scan_error_at: Option<usize>,

    // Scripted results
    pub last_insert_id: Result<i64, DriverError>,
    pub rows_affected: Result<i64, DriverError>,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<Value>>,
    pub supports_query_id: bool,
    pub query_id: String,
    /// Delay before `execute`/`query` complete; cancellation cuts it short
    pub delay: Option<Duration>,

    // Observations
    pub connects: usize,
    pub pings: usize,
    pub closes: usize,
    pub executes: usize,
    pub queries: usize,
    pub prepares: usize,
    pub statement_executes: usize,
    pub statement_closes: usize,
    pub stream_closes: usize,
    pub last_descriptor: Option<String>,
    pub last_auth: Option<&'static str>,
    pub last_params: Vec<Parameter>,
    pub last_mode: Option<ExecMode>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connect_error: None,
            ping_error: None,
            close_error: None,
            exec_error: None,
            query_error: None,
            prepare_error: None,
            statement_error: None,
            stream_close_error: None,
            metadata_error: None,
            stream_error_after: None,
            scan_error_at: None,
            last_insert_id: Ok(0),
            rows_affected: Ok(0),
            columns: Vec::new(),
            column_types: Vec::new(),
            rows: Vec::new(),
            supports_query_id: true,
            query_id: "01b2c3d4-0000-0001-0000-000000000001".to_string(),
            delay: None,
            connects: 0,
            pings: 0,
            closes: 0,
            executes: 0,
            queries: 0,
            prepares: 0,
            statement_executes: 0,
            statement_closes: 0,
            stream_closes: 0,
            last_descriptor: None,
            last_auth: None,
            last_params: Vec::new(),
            last_mode: None,
        }
    }
}

impl MockState {
    /// Script a result set whose columns are all nullable text.
    pub fn with_result_set(&mut self, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.column_types = columns
            .iter()
            .map(|_| ColumnType::new("TEXT").with_length(16_777_216).with_nullable(true))
            .collect();
        self.rows = rows;
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap()
}

/// Sleep for the scripted delay, or until `cancel` fires.
async fn wait(delay: Option<Duration>, cancel: &CancellationToken) -> Result<(), DriverError> {
    let Some(delay) = delay else {
        return Ok(());
    };
    tokio::select! {
        _ = cancel.cancelled() => Err(DriverError::remote("SQL execution canceled")),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

// ============================================================================
// Driver
// ============================================================================

/// In-memory driver scripted through [`MockState`].
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Shared,
    started: Arc<Notify>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script or inspect the driver.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Signalled each time `execute` or `query` starts.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    /// A client over this driver with the default configuration.
    pub fn client(&self) -> Client {
        self.client_with(SessionConfig::default())
    }

    pub fn client_with(&self, config: SessionConfig) -> Client {
        Client::new(Arc::new(self.clone()), config)
    }

    /// A client over this driver with a session already open.
    pub async fn open_client(&self) -> Arc<Client> {
        let client = Arc::new(self.client());
        client.open(DESCRIPTOR).await.unwrap();
        client
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn connect(
        &self,
        config: &ConnectConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError> {
        let mut state = self.state();
        state.connects += 1;
        state.last_descriptor = Some(config.descriptor.clone());
        state.last_auth = Some(config.authenticator.name());
        if let Some(e) = state.connect_error.clone() {
            return Err(e);
        }

        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            started: Arc::clone(&self.started),
        }))
    }
}

struct MockConnection {
    state: Shared,
    started: Arc<Notify>,
}

#[async_trait]
impl DriverConnection for MockConnection {
    async fn ping(&self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.pings += 1;
        state.ping_error.clone().map_or(Ok(()), Err)
    }

    async fn execute(
        &self,
        _sql: &str,
        params: &[Parameter],
        cancel: CancellationToken,
    ) -> Result<Box<dyn DriverExecResult>, DriverError> {
        let delay = {
            let mut state = lock(&self.state);
            state.executes += 1;
            state.last_params = params.to_vec();
            state.last_mode = Some(ExecMode::Blocking);
            state.delay
        };
        self.started.notify_one();
        wait(delay, &cancel).await?;

        let state = lock(&self.state);
        if let Some(e) = state.exec_error.clone() {
            return Err(e);
        }
        Ok(Box::new(MockExecResult {
            last_insert_id: state.last_insert_id.clone(),
            rows_affected: state.rows_affected.clone(),
        }))
    }

    async fn query(
        &self,
        _sql: &str,
        params: &[Parameter],
        cancel: CancellationToken,
    ) -> Result<Box<dyn RowStream>, DriverError> {
        let delay = {
            let mut state = lock(&self.state);
            state.queries += 1;
            state.last_params = params.to_vec();
            state.delay
        };
        self.started.notify_one();
        wait(delay, &cancel).await?;

        let state = lock(&self.state);
        if let Some(e) = state.query_error.clone() {
            return Err(e);
        }
        Ok(Box::new(MockStream {
            state: Arc::clone(&self.state),
            columns: state.columns.clone(),
            column_types: state.column_types.clone(),
            metadata_error: state.metadata_error.clone(),
            rows: state.rows.clone().into(),
            current: None,
            position: 0,
            stream_error_after: state.stream_error_after,
            scan_error_at: state.scan_error_at,
        }))
    }

    async fn prepare(
        &self,
        _sql: &str,
        mode: ExecMode,
    ) -> Result<Box<dyn DriverStatement>, DriverError> {
        let mut state = lock(&self.state);
        state.prepares += 1;
        state.last_mode = Some(mode);
        if let Some(e) = state.prepare_error.clone() {
            return Err(e);
        }
        Ok(Box::new(MockStatement {
            state: Arc::clone(&self.state),
            executed: false,
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.closes += 1;
        state.close_error.clone().map_or(Ok(()), Err)
    }
}

struct MockExecResult {
    last_insert_id: Result<i64, DriverError>,
    rows_affected: Result<i64, DriverError>,
}

impl DriverExecResult for MockExecResult {
    fn last_insert_id(&self) -> Result<i64, DriverError> {
        self.last_insert_id.clone()
    }

    fn rows_affected(&self) -> Result<i64, DriverError> {
        self.rows_affected.clone()
    }
}

struct MockStatement {
    state: Shared,
    executed: bool,
}

#[async_trait]
impl DriverStatement for MockStatement {
    async fn execute(&mut self, params: &[Parameter]) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.statement_executes += 1;
        state.last_params = params.to_vec();
        if let Some(e) = state.statement_error.clone() {
            return Err(e);
        }
        self.executed = true;
        Ok(())
    }

    fn supports_query_id(&self) -> bool {
        lock(&self.state).supports_query_id
    }

    fn query_id(&self) -> String {
        if self.executed {
            lock(&self.state).query_id.clone()
        } else {
            String::new()
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        lock(&self.state).statement_closes += 1;
        Ok(())
    }
}

struct MockStream {
    state: Shared,
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    metadata_error: Option<DriverError>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    position: usize,
    stream_error_after: Option<usize>,
    scan_error_at: Option<usize>,
}

#[async_trait]
impl RowStream for MockStream {
    fn columns(&self) -> Result<Vec<String>, DriverError> {
        match &self.metadata_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.columns.clone()),
        }
    }

    fn column_types(&self) -> Result<Vec<ColumnType>, DriverError> {
        Ok(self.column_types.clone())
    }

    async fn advance(&mut self) -> Result<bool, DriverError> {
        if self.stream_error_after == Some(self.position) {
            return Err(DriverError::Io("connection reset by peer".to_string()));
        }
        self.current = self.rows.pop_front();
        if self.current.is_some() {
            self.position += 1;
        }
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> Result<Vec<Value>, DriverError> {
        if self.scan_error_at.is_some() && self.scan_error_at == self.position.checked_sub(1) {
            return Err(DriverError::Protocol("unsupported column encoding".to_string()));
        }
        self.current.clone().ok_or(DriverError::Closed)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.state);
        state.stream_closes += 1;
        state.stream_close_error.clone().map_or(Ok(()), Err)
    }
}
