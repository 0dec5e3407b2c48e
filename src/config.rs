//! Session configuration.

/// Default option key carrying a private key path inside a descriptor.
pub const DEFAULT_PRIVATE_KEY_OPTION: &str = "privateKeyPath";

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Client name reported to the driver
    pub client_name: String,

    /// Client version reported to the driver
    pub client_version: String,

    /// Reserved descriptor option naming a PEM private key file
    pub private_key_option: String,

    /// Health-check new connections before registering them
    pub ping_on_open: bool,

    /// Include statement text in debug logs
    pub log_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            private_key_option: DEFAULT_PRIVATE_KEY_OPTION.to_string(),
            ping_on_open: true,
            log_statements: false,
        }
    }
}

impl SessionConfig {
    /// Set client information.
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = name.into();
        self.client_version = version.into();
        self
    }

    /// Set the reserved private key option name.
    pub fn with_private_key_option(mut self, option: impl Into<String>) -> Self {
        self.private_key_option = option.into();
        self
    }

    /// Enable or disable the post-connect health check.
    pub fn with_ping_on_open(mut self, enabled: bool) -> Self {
        self.ping_on_open = enabled;
        self
    }

    /// Enable or disable statement text in debug logs.
    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
}
