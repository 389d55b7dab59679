//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (nested fields use the `__` separator, e.g.
//! `IDENTITY__AUTH_DOMAIN`). The process fails at startup if any required
//! identity setting is absent.
//!
//! See [`IdentityConfig`](turnstile_identity::IdentityConfig) for the
//! provider settings.

use serde::Deserialize;
use turnstile_identity::IdentityConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Gate behavior configuration.
    #[serde(default)]
    pub gate: GateConfig,

    /// Identity provider configuration.
    pub identity: IdentityConfig,
}

/// Configuration for the request gates and session cookies.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Whether to set the Secure flag on session cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// The permission required by the staff gate, compared for exact
    /// equality against the first entry of the session's permission list.
    #[serde(default = "default_staff_permission")]
    pub staff_permission: String,

    /// When true, the staff gate reproduces the historical rule: deny only
    /// when the session is unauthenticated *and* the permission is wrong.
    /// The default policy denies when either check fails.
    #[serde(default)]
    pub legacy_staff_rule: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_staff_permission() -> String {
    "staff-perm".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            secure_cookies: default_secure_cookies(),
            staff_permission: default_staff_permission(),
            legacy_staff_rule: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_config_has_correct_defaults() {
        let config = GateConfig::default();
        assert!(config.secure_cookies);
        assert_eq!(config.staff_permission, "staff-perm");
        assert!(!config.legacy_staff_rule);
    }

    #[test]
    fn server_config_requires_identity_settings() {
        let empty = config::Config::builder().build().expect("build");
        assert!(empty.try_deserialize::<ServerConfig>().is_err());
    }
}
