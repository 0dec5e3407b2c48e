//! Connection management for the remote database session.
//!
//! This module provides descriptor parsing, authentication setup, the session
//! registry and the connection manager that opens and closes the session.
//!
//! # Example
//!
//! ```no_run
//! # use warehouse_session::connection::{ConnectionManager, SessionRegistry};
//! # use warehouse_session::driver::Driver;
//! # use warehouse_session::SessionConfig;
//! # use std::sync::Arc;
//! # async fn example(driver: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SessionRegistry::new());
//! let manager = ConnectionManager::new(driver, Arc::clone(&registry), SessionConfig::default());
//!
//! manager.open("user:pass@account/DB/PUBLIC?warehouse=WH").await?;
//! manager.ping().await?;
//! manager.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod descriptor;
pub mod manager;
pub mod registry;

pub use auth::Authenticator;
pub use descriptor::ConnectionDescriptor;
pub use manager::ConnectionManager;
pub use registry::{Session, SessionRegistry};
