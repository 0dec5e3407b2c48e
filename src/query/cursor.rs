//! Streaming cursors.
//!
//! The `CursorManager` holds at most one open [`Cursor`]. Opening a new cursor
//! closes the current one first; a cursor that was superseded or closed
//! rejects further reads with `NoOpenCursor`.

use crate::config::SessionConfig;
use crate::connection::SessionRegistry;
use crate::driver::{DriverError, RowStream};
use crate::error::{CursorError, QueryError};
use crate::query::args::{bind_arguments, Argument};
use crate::query::cancel::{CancelHandle, CancelSlot};
use crate::query::results::{ColumnDescriptor, Row};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

static NEXT_CURSOR_ID: AtomicU64 = AtomicU64::new(1);

struct CursorState {
    stream: Option<Box<dyn RowStream>>,
    exhausted: bool,
    rows_read: u64,
}

/// One open streaming result set.
///
/// Column metadata is captured once when the cursor opens. Reads and closes
/// are serialized by the cursor's own lock.
pub struct Cursor {
    id: u64,
    columns: Vec<ColumnDescriptor>,
    state: tokio::sync::Mutex<CursorState>,
    closed: AtomicBool,
    superseded_close_error: Option<DriverError>,
}

impl Cursor {
    fn new(
        stream: Box<dyn RowStream>,
        columns: Vec<ColumnDescriptor>,
        superseded_close_error: Option<DriverError>,
    ) -> Self {
        Self {
            id: NEXT_CURSOR_ID.fetch_add(1, Ordering::Relaxed),
            columns,
            state: tokio::sync::Mutex::new(CursorState {
                stream: Some(stream),
                exhausted: false,
                rows_read: 0,
            }),
            closed: AtomicBool::new(false),
            superseded_close_error,
        }
    }

    /// Process-unique cursor identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Column names, in result order.
    pub fn columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Column type descriptors, in result order.
    pub fn column_types(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Check if the cursor can still be read.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Error reported while closing the cursor this one replaced, if any.
    pub fn superseded_close_error(&self) -> Option<&DriverError> {
        self.superseded_close_error.as_ref()
    }

    /// Pull the next row.
    ///
    /// Returns `Ok(None)` once the stream is exhausted; further calls keep
    /// returning `Ok(None)` without touching the driver.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenCursor` if the cursor was closed, `Stream` if the stream
    /// failed to advance and `Scan` if the current row could not be read.
    pub async fn advance(&self) -> Result<Option<Row>, CursorError> {
        let mut state = self.state.lock().await;
        if !self.is_open() {
            return Err(CursorError::NoOpenCursor);
        }
        if state.exhausted {
            return Ok(None);
        }

        let stream = state.stream.as_mut().ok_or(CursorError::NoOpenCursor)?;
        if !stream.advance().await.map_err(CursorError::Stream)? {
            state.exhausted = true;
            debug!(cursor_id = self.id, rows = state.rows_read, "Cursor exhausted");
            return Ok(None);
        }

        let values = stream.scan().map_err(CursorError::Scan)?;
        state.rows_read += 1;
        Ok(Some(Row::from_values(&values)))
    }

    /// Close the cursor and release its stream. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Close` if the driver failed to release the stream. The cursor
    /// is considered closed either way.
    pub async fn close(&self) -> Result<(), CursorError> {
        let mut state = self.state.lock().await;
        self.closed.store(true, Ordering::Release);

        match state.stream.take() {
            Some(mut stream) => {
                debug!(cursor_id = self.id, rows = state.rows_read, "Closing cursor");
                stream.close().await.map_err(CursorError::Close)
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("columns", &self.columns)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Holds the single current cursor.
#[derive(Debug)]
pub struct CursorManager {
    registry: Arc<SessionRegistry>,
    /// Serializes open, advance and close
    ops: tokio::sync::Mutex<()>,
    /// Current cursor; only held briefly, never across an await
    current: Mutex<Option<Arc<Cursor>>>,
    /// Token of the in-flight open
    cancel: Arc<CancelSlot>,
    log_statements: bool,
}

impl CursorManager {
    /// Create a new cursor manager.
    pub fn new(registry: Arc<SessionRegistry>, config: &SessionConfig) -> Self {
        Self {
            registry,
            ops: tokio::sync::Mutex::new(()),
            current: Mutex::new(None),
            cancel: Arc::new(CancelSlot::new()),
            log_statements: config.log_statements,
        }
    }

    fn current(&self) -> Option<Arc<Cursor>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, cursor: Option<Arc<Cursor>>) -> Option<Arc<Cursor>> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, cursor)
    }

    fn open_cursor(&self) -> Result<Arc<Cursor>, CursorError> {
        self.current().ok_or(CursorError::NoOpenCursor)
    }

    /// Run a row-returning statement and install its cursor.
    ///
    /// The session and arguments are validated first; then the current cursor
    /// is closed. A failure to close it is logged and kept on the new cursor
    /// (see [`Cursor::superseded_close_error`]) but does not block the open.
    ///
    /// # Errors
    ///
    /// Returns `Open` wrapping `NotInitialized`, `ArgConversionFailed`,
    /// `Remote` or `Cancelled`, and `Metadata` if the column metadata could not
    /// be read.
    pub async fn open(&self, sql: &str, args: &[Argument]) -> Result<Arc<Cursor>, CursorError> {
        let _ops = self.ops.lock().await;

        let session = self.registry.current().await.map_err(QueryError::from)?;
        let params = bind_arguments(args)?;

        let mut superseded_close_error = None;
        if let Some(previous) = self.replace(None) {
            if let Err(e) = previous.close().await {
                warn!(cursor_id = previous.id(), error = %e, "Failed to close superseded cursor");
                if let CursorError::Close(source) = e {
                    superseded_close_error = Some(source);
                }
            }
        }

        let guard = self.cancel.bind();
        let statement = session.record_statement();
        if self.log_statements {
            debug!(session_id = session.id(), statement, sql, "Opening cursor");
        } else {
            debug!(session_id = session.id(), statement, "Opening cursor");
        }

        let mut stream = tokio::select! {
            biased;
            _ = guard.token().cancelled() => {
                warn!(session_id = session.id(), statement, "Cursor open cancelled");
                return Err(QueryError::Cancelled.into());
            }
            result = session.connection().query(sql, &params, guard.token().clone()) => {
                result.map_err(QueryError::Remote)?
            }
        };
        drop(guard);

        let columns = match describe(stream.as_ref()) {
            Ok(columns) => columns,
            Err(e) => {
                if let Err(close_err) = stream.close().await {
                    warn!(error = %close_err, "Failed to close stream after metadata error");
                }
                return Err(CursorError::Metadata(e));
            }
        };

        let cursor = Arc::new(Cursor::new(stream, columns, superseded_close_error));
        info!(
            cursor_id = cursor.id(),
            columns = cursor.column_types().len(),
            "Cursor opened"
        );
        self.replace(Some(Arc::clone(&cursor)));
        Ok(cursor)
    }

    /// Column names of the current cursor.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenCursor` if no cursor is open.
    pub fn columns(&self) -> Result<Vec<String>, CursorError> {
        Ok(self.open_cursor()?.columns())
    }

    /// Column type descriptors of the current cursor.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenCursor` if no cursor is open.
    pub fn column_types(&self) -> Result<Vec<ColumnDescriptor>, CursorError> {
        Ok(self.open_cursor()?.column_types().to_vec())
    }

    /// Pull the next row from the current cursor. `Ok(None)` on exhaustion.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenCursor`, `Stream` or `Scan`.
    pub async fn advance(&self) -> Result<Option<Row>, CursorError> {
        let _ops = self.ops.lock().await;
        self.open_cursor()?.advance().await
    }

    /// Close the current cursor, if any. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Close` if the driver failed to release the stream; the cursor is
    /// removed regardless.
    pub async fn close(&self) -> Result<(), CursorError> {
        let _ops = self.ops.lock().await;
        match self.replace(None) {
            Some(cursor) => cursor.close().await,
            None => Ok(()),
        }
    }

    /// Check if a cursor is open.
    pub fn is_open(&self) -> bool {
        self.current().is_some_and(|c| c.is_open())
    }

    /// Cancel the in-flight cursor open. Returns `false` if none is bound.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Handle for cancelling cursor opens from another component.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancel))
    }
}

fn describe(stream: &dyn RowStream) -> Result<Vec<ColumnDescriptor>, DriverError> {
    let names = stream.columns()?;
    let types = stream.column_types()?;
    if names.len() != types.len() {
        return Err(DriverError::Protocol(format!(
            "driver reported {} column names but {} column types",
            names.len(),
            types.len()
        )));
    }

    Ok(names
        .into_iter()
        .zip(types.iter())
        .map(|(name, column_type)| ColumnDescriptor::from_driver(name, column_type))
        .collect())
}
