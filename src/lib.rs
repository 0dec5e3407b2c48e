//! # warehouse-session
//!
//! Single-connection session manager for remote analytical databases.
//!
//! This library owns one connection to a remote database, runs statements
//! either to completion or as asynchronous dispatches that return a remote
//! tracking identifier, and streams result sets through a single pull-based
//! cursor. Long-running work can be cancelled cooperatively through
//! cancellation handles; the wire protocol itself is supplied by a
//! [`driver::Driver`] implementation.
//!
//! ## Example
//!
//! ```no_run
//! # use warehouse_session::*;
//! # use std::sync::Arc;
//! # async fn example(driver: Arc<dyn driver::Driver>) -> Result<(), SessionError> {
//! let client = Client::new(driver, SessionConfig::default());
//! client.open("user:pass@account/DB/PUBLIC?warehouse=WH").await?;
//!
//! // Forward Ctrl-C to whatever is in flight
//! let _interrupts = signal::spawn_interrupt_forwarder(client.cancel_handles());
//!
//! client.fetch("SELECT a, b FROM t", &[]).await?;
//! println!("Columns: {:?}", client.columns()?);
//! while let Some(row) = client.next_row().await? {
//!     println!("{:?}", row.display_values());
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod client;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod logging;
pub mod query;
pub mod signal;

// Re-export public API
pub use client::Client;
pub use config::SessionConfig;
pub use error::{ConnectionError, CursorError, DriverError, QueryError, SessionError};
pub use query::{
    ArgType, Argument, AsyncOutcome, ColumnDescriptor, ExecOutcome, ResultSet, Row, NULL_SENTINEL,
};
