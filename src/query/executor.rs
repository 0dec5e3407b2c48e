//! Statement execution.
//!
//! The `ExecutionEngine` runs statements that do not stream rows, either
//! blocking (the caller waits for completion or cancellation) or async (the
//! caller gets the remote tracking identifier as soon as the statement is
//! accepted).

use crate::config::SessionConfig;
use crate::connection::SessionRegistry;
use crate::driver::{DriverExecResult, ExecMode};
use crate::error::QueryError;
use crate::query::args::{bind_arguments, Argument};
use crate::query::cancel::{CancelHandle, CancelSlot};
use crate::query::results::{AsyncOutcome, ExecOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs non-streaming statements against the current session.
#[derive(Debug)]
pub struct ExecutionEngine {
    /// Registry holding the current session
    registry: Arc<SessionRegistry>,
    /// Token of the in-flight blocking execution
    cancel: Arc<CancelSlot>,
    /// Include statement text in debug logs
    log_statements: bool,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new(registry: Arc<SessionRegistry>, config: &SessionConfig) -> Self {
        Self {
            registry,
            cancel: Arc::new(CancelSlot::new()),
            log_statements: config.log_statements,
        }
    }

    /// Run a statement to completion.
    ///
    /// The call races remote completion against cancellation through
    /// [`ExecutionEngine::cancel`]; a cancelled call never returns a partial
    /// outcome. Failures to read the affected-row count or last insert ID after
    /// a successful statement leave the corresponding field empty.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session, `ArgConversionFailed` for a
    /// bad argument, `Remote` if the driver fails and `Cancelled` if the call was
    /// cancelled first.
    pub async fn execute(&self, sql: &str, args: &[Argument]) -> Result<ExecOutcome, QueryError> {
        let session = self.registry.current().await?;
        let params = bind_arguments(args)?;

        let guard = self.cancel.bind();
        let statement = session.record_statement();
        if self.log_statements {
            debug!(session_id = session.id(), statement, sql, "Executing statement");
        } else {
            debug!(session_id = session.id(), statement, "Executing statement");
        }

        let result = tokio::select! {
            biased;
            _ = guard.token().cancelled() => {
                warn!(session_id = session.id(), statement, "Statement cancelled");
                return Err(QueryError::Cancelled);
            }
            result = session.connection().execute(sql, &params, guard.token().clone()) => {
                result.map_err(QueryError::Remote)?
            }
        };

        Ok(collect_outcome(result.as_ref()))
    }

    /// Cancel the in-flight blocking execution. Returns `false` if none is bound.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Handle for cancelling blocking executions from another component.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.cancel))
    }

    /// Dispatch a statement without waiting for it to complete.
    ///
    /// Arguments are converted before anything is sent. The statement is
    /// prepared in async mode, executed, and the tracking identifier assigned by
    /// the remote system is returned.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session, `ArgConversionFailed` for a
    /// bad argument, `UnsupportedByDriver` if the statement handle cannot report
    /// identifiers, `Remote` if the driver fails, and `EmptyQueryId` if the
    /// remote system accepted the statement without an identifier.
    pub async fn execute_async(
        &self,
        sql: &str,
        args: &[Argument],
    ) -> Result<AsyncOutcome, QueryError> {
        let session = self.registry.current().await?;
        let params = bind_arguments(args)?;

        let mut stmt = session
            .connection()
            .prepare(sql, ExecMode::Async)
            .await
            .map_err(QueryError::Remote)?;

        let dispatched = if stmt.supports_query_id() {
            let statement = session.record_statement();
            debug!(session_id = session.id(), statement, "Dispatching async statement");
            stmt.execute(&params)
                .await
                .map(|()| stmt.query_id())
                .map_err(QueryError::Remote)
        } else {
            Err(QueryError::UnsupportedByDriver)
        };

        if let Err(e) = stmt.close().await {
            warn!(error = %e, "Failed to close async statement handle");
        }

        let query_id = dispatched?;
        let outcome = AsyncOutcome::new(query_id).ok_or(QueryError::EmptyQueryId)?;
        debug!(query_id = outcome.query_id(), "Async statement accepted");
        Ok(outcome)
    }
}

fn collect_outcome(result: &dyn DriverExecResult) -> ExecOutcome {
    let last_insert_id = match result.last_insert_id() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(error = %e, "Last insert ID unavailable");
            None
        }
    };

    let rows_affected = match result.rows_affected() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Rows affected unavailable");
            None
        }
    };

    ExecOutcome {
        last_insert_id,
        rows_affected,
    }
}
