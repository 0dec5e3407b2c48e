//! Error types for warehouse-session.
//!
//! This module defines domain-specific error types organized by functional area.
//! Every error renders a human-readable message through `Display`; that string is
//! what crosses the boundary to callers on the other side of the marshaling layer.

use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Connection lifecycle errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Statement execution errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Cursor errors
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Logging or configuration setup errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors related to the connection lifecycle.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// No session has been opened
    #[error("database connection not initialized")]
    NotInitialized,

    /// The connection descriptor could not be parsed
    #[error("Failed to parse connection descriptor: {0}")]
    InvalidDescriptor(String),

    /// Connecting or the post-connect health check failed
    #[error("Failed to connect: {stage}")]
    ConnectFailed {
        stage: &'static str,
        #[source]
        source: DriverError,
    },

    /// Health check on an established session failed
    #[error("Failed to ping database")]
    Unreachable(#[source] DriverError),

    /// The private key file could not be read or decoded
    #[error("Failed to load private key from '{path}': {message}")]
    KeyLoad { path: String, message: String },

    /// The private key decoded fine but is not an RSA key
    #[error("Private key in '{path}' is not an RSA key (algorithm {algorithm})")]
    NotRsaKey { path: String, algorithm: String },

    /// Closing the previous session before a re-open failed
    #[error("Failed to close existing connection")]
    CloseExistingFailed(#[source] DriverError),

    /// Closing the session failed
    #[error("Failed to close database")]
    CloseFailed(#[source] DriverError),
}

/// Errors related to statement execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No session has been opened
    #[error("database connection not initialized")]
    NotInitialized,

    /// A positional argument could not be converted for the remote protocol
    #[error("Error converting argument {index}: {message}")]
    ArgConversionFailed { index: usize, message: String },

    /// The driver reported a failure
    #[error("Query execution failed")]
    Remote(#[source] DriverError),

    /// The operation was cancelled before the remote side completed
    #[error("Query cancelled")]
    Cancelled,

    /// The remote side accepted an async statement but reported no identifier
    #[error("Remote system returned an empty query ID")]
    EmptyQueryId,

    /// The prepared statement cannot report a tracking identifier
    #[error("Statement does not support query ID retrieval")]
    UnsupportedByDriver,
}

impl From<ConnectionError> for QueryError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotInitialized => QueryError::NotInitialized,
            ConnectionError::Unreachable(source)
            | ConnectionError::ConnectFailed { source, .. }
            | ConnectionError::CloseExistingFailed(source)
            | ConnectionError::CloseFailed(source) => QueryError::Remote(source),
            other => QueryError::Remote(DriverError::Protocol(other.to_string())),
        }
    }
}

/// Errors related to cursors and row materialization.
#[derive(Error, Debug)]
pub enum CursorError {
    /// No cursor is open, or the addressed cursor was closed or superseded
    #[error("no cursor available")]
    NoOpenCursor,

    /// Opening the cursor failed
    #[error(transparent)]
    Open(#[from] QueryError),

    /// The driver could not read column metadata for a new cursor
    #[error("error getting columns")]
    Metadata(#[source] DriverError),

    /// The current row could not be scanned
    #[error("error scanning row")]
    Scan(#[source] DriverError),

    /// The row stream failed while advancing
    #[error("error advancing cursor")]
    Stream(#[source] DriverError),

    /// Releasing the row stream failed
    #[error("error closing cursor")]
    Close(#[source] DriverError),
}

/// Errors reported by the underlying database driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The remote system rejected the request
    #[error("{message}{}", sql_state_suffix(.sql_state))]
    Remote {
        message: String,
        sql_state: Option<String>,
    },

    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(String),

    /// Protocol or driver-internal error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The connection or stream was already closed
    #[error("Connection is closed")]
    Closed,
}

impl DriverError {
    /// Create a remote error without a SQL state.
    pub fn remote(message: impl Into<String>) -> Self {
        DriverError::Remote {
            message: message.into(),
            sql_state: None,
        }
    }

    /// Create a remote error with a SQL state.
    pub fn remote_with_state(message: impl Into<String>, sql_state: impl Into<String>) -> Self {
        DriverError::Remote {
            message: message.into(),
            sql_state: Some(sql_state.into()),
        }
    }
}

fn sql_state_suffix(sql_state: &Option<String>) -> String {
    sql_state
        .as_ref()
        .map(|state| format!(" (SQL state: {state})"))
        .unwrap_or_default()
}

impl SessionError {
    /// Render the full cause chain as one line, the form handed across the boundary.
    pub fn render(&self) -> String {
        render_chain(self)
    }
}

/// Join an error and all of its sources with `": "`.
pub fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err.to_string())
    }
}
