//! Authentication handling for remote database connections.
//!
//! Two modes are supported: the descriptor carries everything the driver needs
//! (`Authenticator::Default`), or the descriptor names a PEM-encoded PKCS#8 RSA
//! private key which is loaded here and handed to the driver for key-pair/JWT
//! authentication (`Authenticator::Jwt`).

use crate::connection::descriptor::ConnectionDescriptor;
use crate::error::ConnectionError;
use rsa::pkcs8::{PrivateKeyInfo, SecretDocument};
use rsa::RsaPrivateKey;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Descriptor option selecting the authenticator.
pub const AUTHENTICATOR_OPTION: &str = "authenticator";

/// Authenticator value for key-pair authentication.
pub const JWT_AUTHENTICATOR: &str = "SNOWFLAKE_JWT";

/// Authentication mode handed to the driver.
#[derive(Clone)]
pub enum Authenticator {
    /// Credentials are embedded in the descriptor
    Default,
    /// Key-pair authentication with a loaded RSA private key
    Jwt(Arc<RsaPrivateKey>),
}

impl Authenticator {
    /// Check if this is key-based authentication.
    pub fn is_key_based(&self) -> bool {
        matches!(self, Authenticator::Jwt(_))
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Authenticator::Default => "default",
            Authenticator::Jwt(_) => "jwt",
        }
    }
}

// Key material never reaches debug output
impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::Default => write!(f, "Default"),
            Authenticator::Jwt(_) => write!(f, "Jwt(<redacted>)"),
        }
    }
}

/// Resolve the authentication mode for a descriptor.
///
/// If the descriptor carries `key_option`, that option is stripped, the key it
/// names is loaded, and the descriptor is rebuilt for JWT authentication.
/// Otherwise the descriptor is returned unchanged.
pub async fn resolve(
    descriptor: &ConnectionDescriptor,
    key_option: &str,
) -> Result<(ConnectionDescriptor, Authenticator), ConnectionError> {
    let Some(key_path) = descriptor.option(key_option).filter(|p| !p.is_empty()) else {
        return Ok((descriptor.clone(), Authenticator::Default));
    };

    let key = load_private_key(Path::new(&key_path)).await?;
    let rebuilt = descriptor
        .without_option(key_option)
        .with_option(AUTHENTICATOR_OPTION, JWT_AUTHENTICATOR);

    Ok((rebuilt, Authenticator::Jwt(Arc::new(key))))
}

/// Load a PEM-encoded PKCS#8 RSA private key from a file.
///
/// # Errors
///
/// Returns `ConnectionError::KeyLoad` if the file cannot be read or decoded and
/// `ConnectionError::NotRsaKey` if it holds a key of another algorithm.
pub async fn load_private_key(path: &Path) -> Result<RsaPrivateKey, ConnectionError> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| key_load_error(path, e))?;
    decode_private_key(path, &pem)
}

/// Decode a PEM-encoded PKCS#8 RSA private key. `path` is only used in errors.
pub fn decode_private_key(path: &Path, pem: &str) -> Result<RsaPrivateKey, ConnectionError> {
    let (_label, document) = SecretDocument::from_pem(pem)
        .map_err(|e| key_load_error(path, format!("failed to decode PEM block: {}", e)))?;

    let info = PrivateKeyInfo::try_from(document.as_bytes())
        .map_err(|e| key_load_error(path, e))?;

    if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(ConnectionError::NotRsaKey {
            path: path.display().to_string(),
            algorithm: info.algorithm.oid.to_string(),
        });
    }

    RsaPrivateKey::try_from(info).map_err(|e| key_load_error(path, e))
}

fn key_load_error(path: &Path, err: impl fmt::Display) -> ConnectionError {
    ConnectionError::KeyLoad {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
