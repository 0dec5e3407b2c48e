//! Connection lifecycle management.
//!
//! The `ConnectionManager` opens, health-checks and closes the single session
//! held by the `SessionRegistry`.

use crate::config::SessionConfig;
use crate::connection::auth;
use crate::connection::descriptor::ConnectionDescriptor;
use crate::connection::registry::{Session, SessionRegistry};
use crate::driver::{ConnectConfig, Driver};
use crate::error::ConnectionError;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens and closes the session held by a registry.
pub struct ConnectionManager {
    /// Driver used to open connections
    driver: Arc<dyn Driver>,
    /// Registry holding the current session
    registry: Arc<SessionRegistry>,
    /// Session configuration
    config: SessionConfig,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(
        driver: Arc<dyn Driver>,
        registry: Arc<SessionRegistry>,
        config: SessionConfig,
    ) -> Self {
        Self {
            driver,
            registry,
            config,
        }
    }

    /// Open a session from a descriptor, replacing any current session.
    ///
    /// The current session is closed first; if that fails the re-open is aborted
    /// with `CloseExistingFailed` and the current session stays registered.
    /// A connection that fails its health check is closed again and never
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the descriptor is invalid, the previous
    /// session cannot be closed, the private key cannot be loaded, or the
    /// connection or its health check fails.
    pub async fn open(&self, descriptor: &str) -> Result<Arc<Session>, ConnectionError> {
        // Parse before closing the current session: a bad descriptor must not tear it down
        let descriptor = ConnectionDescriptor::from_str(descriptor)?;

        let mut slot = self.registry.lock_exclusive().await;

        if let Some(existing) = slot.as_ref() {
            existing
                .close()
                .await
                .map_err(ConnectionError::CloseExistingFailed)?;
            info!(session_id = existing.id(), "Closed existing session before re-open");
            *slot = None;
        }

        let (descriptor, authenticator) =
            auth::resolve(&descriptor, &self.config.private_key_option).await?;

        let connect_config = ConnectConfig {
            descriptor: descriptor.render(),
            authenticator: authenticator.clone(),
            client_name: self.config.client_name.clone(),
            client_version: self.config.client_version.clone(),
        };

        debug!(
            descriptor = %descriptor.redacted(),
            auth = authenticator.name(),
            "Connecting"
        );

        let connection = self
            .driver
            .connect(&connect_config)
            .await
            .map_err(|source| ConnectionError::ConnectFailed {
                stage: "connect",
                source,
            })?;

        if self.config.ping_on_open {
            if let Err(source) = connection.ping().await {
                if let Err(close_err) = connection.close().await {
                    warn!(error = %close_err, "Failed to close connection after failed ping");
                }
                return Err(ConnectionError::ConnectFailed {
                    stage: "ping",
                    source,
                });
            }
        }

        let session = Arc::new(Session::new(
            connection,
            descriptor.redacted(),
            &authenticator,
        ));
        SessionRegistry::install(&mut slot, Arc::clone(&session));

        info!(
            session_id = session.id(),
            descriptor = session.descriptor(),
            auth = session.auth_mode(),
            "Session opened"
        );

        Ok(session)
    }

    /// Health-check the current session.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session and `Unreachable` if the
    /// health check fails.
    pub async fn ping(&self) -> Result<(), ConnectionError> {
        let session = self.registry.current().await?;
        session
            .connection()
            .ping()
            .await
            .map_err(ConnectionError::Unreachable)
    }

    /// Close the current session. Closing without a session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CloseFailed` if the driver fails to close; the session then stays
    /// registered so the close can be retried.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let mut slot = self.registry.lock_exclusive().await;

        let Some(session) = slot.as_ref() else {
            return Ok(());
        };

        session.close().await.map_err(ConnectionError::CloseFailed)?;
        info!(
            session_id = session.id(),
            statements = session.statement_count(),
            "Session closed"
        );
        *slot = None;

        Ok(())
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverConnection;
    use crate::error::DriverError;
    use async_trait::async_trait;

    struct RefusingDriver;

    #[async_trait]
    impl Driver for RefusingDriver {
        async fn connect(
            &self,
            _config: &ConnectConfig,
        ) -> Result<Box<dyn DriverConnection>, DriverError> {
            Err(DriverError::Io("connection refused".to_string()))
        }
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::new(
            Arc::new(RefusingDriver),
            Arc::new(SessionRegistry::new()),
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_ping_without_session() {
        let result = manager().ping().await;
        assert!(matches!(result, Err(ConnectionError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_close_without_session_is_noop() {
        let manager = manager();
        assert!(manager.close().await.is_ok());
        assert!(manager.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_open_invalid_descriptor() {
        let result = manager().open("").await;
        assert!(matches!(result, Err(ConnectionError::InvalidDescriptor(_))));
    }

    #[tokio::test]
    async fn test_open_connect_failure_registers_nothing() {
        let registry = Arc::new(SessionRegistry::new());
        let manager = ConnectionManager::new(
            Arc::new(RefusingDriver),
            Arc::clone(&registry),
            SessionConfig::default(),
        );

        let result = manager.open("alice:pw@acme/DB").await;
        match result {
            Err(ConnectionError::ConnectFailed { stage, source }) => {
                assert_eq!(stage, "connect");
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("Expected ConnectFailed, got {:?}", other),
        }
        assert!(!registry.is_initialized().await);
    }

    #[tokio::test]
    async fn test_open_with_missing_key_file() {
        let result = manager()
            .open("alice@acme/DB?privateKeyPath=/nonexistent/key.p8")
            .await;
        assert!(matches!(result, Err(ConnectionError::KeyLoad { .. })));
    }
}
