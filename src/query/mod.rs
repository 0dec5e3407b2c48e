//! Statement execution and result handling.
//!
//! The query module is organized into:
//! - `args` - positional argument conversion
//! - `cancel` - cancellation slots shared with outer layers
//! - `executor` - blocking and async execution of non-streaming statements
//! - `cursor` - the single streaming cursor
//! - `results` - execution outcomes, column descriptors and rows
//!
//! The execution engine and the cursor manager are independent; both read the
//! current session from the shared [`SessionRegistry`](crate::connection::SessionRegistry).
//!
//! # Example
//!
//! ```no_run
//! use warehouse_session::connection::SessionRegistry;
//! use warehouse_session::query::{Argument, CursorManager, ExecutionEngine};
//! use warehouse_session::SessionConfig;
//! use std::sync::Arc;
//!
//! # async fn example(registry: Arc<SessionRegistry>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::default();
//! let engine = ExecutionEngine::new(Arc::clone(&registry), &config);
//! let outcome = engine
//!     .execute("UPDATE t SET x = ? WHERE id = ?", &[Argument::string("a"), 7_i64.into()])
//!     .await?;
//! println!("Rows affected: {}", outcome.rows_affected_or_zero());
//!
//! let cursors = CursorManager::new(registry, &config);
//! cursors.open("SELECT a, b FROM t", &[]).await?;
//! while let Some(row) = cursors.advance().await? {
//!     println!("{:?}", row.display_values());
//! }
//! cursors.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod cancel;
pub mod cursor;
pub mod executor;
pub mod results;

pub use args::{bind_arguments, ArgType, Argument};
pub use cancel::{CancelHandle, CancelSlot};
pub use cursor::{Cursor, CursorManager};
pub use executor::ExecutionEngine;
pub use results::{AsyncOutcome, ColumnDescriptor, ExecOutcome, ResultSet, Row, NULL_SENTINEL};
