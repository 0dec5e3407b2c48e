//! Log subscriber setup for embedding applications.
//!
//! The library itself only emits `tracing` events; nothing in the session
//! layer installs a subscriber.

use crate::error::SessionError;
use tracing_subscriber::EnvFilter;

/// Targets that are quiet unless explicitly raised.
const NOISY_TARGETS: &[(&str, &str)] = &[("rustls", "warn"), ("hyper", "warn"), ("h2", "warn")];

/// Build the filter from a base directive plus the noisy-target overrides.
///
/// `RUST_LOG`, when set, wins over `directives`.
fn build_env_filter(directives: &str) -> Result<EnvFilter, SessionError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut parts = vec![directives.to_string()];
    for (target, level) in NOISY_TARGETS {
        parts.push(format!("{}={}", target, level));
    }

    let filter = parts.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|e| SessionError::Config(format!("Invalid tracing filter '{}': {}", filter, e)))
}

/// Install a compact fmt subscriber as the global default.
///
/// # Errors
///
/// Returns `Config` if the directives cannot be parsed or a global subscriber
/// is already installed.
pub fn init_logging(directives: &str) -> Result<(), SessionError> {
    let filter = build_env_filter(directives)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| SessionError::Config(format!("Failed to install subscriber: {}", e)))
}
