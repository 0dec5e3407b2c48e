//! Session registry.
//!
//! Holds the single live session. Reads (the common case) take the shared side of
//! the lock; the connection manager takes the exclusive side while it opens or
//! closes a session.

use crate::connection::auth::Authenticator;
use crate::driver::DriverConnection;
use crate::error::{ConnectionError, DriverError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The single live connection to the remote database.
pub struct Session {
    /// Process-local session identifier
    id: u64,

    /// Descriptor with the password masked, for logs
    descriptor: String,

    /// Authentication mode the session was opened with
    auth_mode: &'static str,

    /// Underlying driver connection
    connection: Box<dyn DriverConnection>,

    /// When the session was opened
    opened_at: Instant,

    /// Statements dispatched through this session
    statement_count: AtomicU64,

    /// Set once the driver connection has been closed
    closed: AtomicBool,
}

impl Session {
    /// Create a new session around an open driver connection.
    pub fn new(
        connection: Box<dyn DriverConnection>,
        descriptor: String,
        authenticator: &Authenticator,
    ) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            descriptor,
            auth_mode: authenticator.name(),
            connection,
            opened_at: Instant::now(),
            statement_count: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the redacted descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Get the authentication mode name.
    pub fn auth_mode(&self) -> &'static str {
        self.auth_mode
    }

    /// Get the driver connection.
    pub fn connection(&self) -> &dyn DriverConnection {
        self.connection.as_ref()
    }

    /// Time since the session was opened.
    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }

    /// Count a dispatched statement and return the new total.
    pub fn record_statement(&self) -> u64 {
        self.statement_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Total statements dispatched.
    pub fn statement_count(&self) -> u64 {
        self.statement_count.load(Ordering::SeqCst)
    }

    /// Check if the driver connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the driver connection. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), DriverError> {
        if self.is_closed() {
            return Ok(());
        }
        self.connection.close().await?;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("auth_mode", &self.auth_mode)
            .field("statement_count", &self.statement_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Holder of the current session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slot: RwLock<Option<Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session, replacing any existing one.
    ///
    /// This is the entry point for embedders that open connections without a
    /// `ConnectionManager`. The previous session must already have been closed
    /// by the caller; it is returned so the caller can check.
    pub async fn initialize(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let mut slot = self.slot.write().await;
        Self::install(&mut slot, session)
    }

    /// Put a session into a slot held under the exclusive lock.
    pub(crate) fn install(
        slot: &mut Option<Arc<Session>>,
        session: Arc<Session>,
    ) -> Option<Arc<Session>> {
        debug!(session_id = session.id(), "Installing session");
        let previous = slot.replace(session);
        if let Some(previous) = previous.as_ref() {
            if !previous.is_closed() {
                warn!(session_id = previous.id(), "Replaced a session that is still open");
            }
        }
        previous
    }

    /// Get the active session.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::NotInitialized` if no session is set.
    pub async fn current(&self) -> Result<Arc<Session>, ConnectionError> {
        self.slot
            .read()
            .await
            .clone()
            .ok_or(ConnectionError::NotInitialized)
    }

    /// Check whether a session is set.
    pub async fn is_initialized(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Take the exclusive side of the lock for a multi-step open or close.
    pub(crate) async fn lock_exclusive(&self) -> RwLockWriteGuard<'_, Option<Arc<Session>>> {
        self.slot.write().await
    }
}
