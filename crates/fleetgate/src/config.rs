//! Server configuration, loadable from a TOML file.
//!
//! ```toml
//! bind = "0.0.0.0:3000"
//! sweep_interval_secs = 300
//!
//! [session]
//! ttl_secs = 28800
//!
//! [access]
//! session_cookie = "fleet_session"
//! public_prefixes = ["/login", "/static"]
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use fleetgate_access::{AccessConfig, AccessError};
use fleetgate_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::FleetgateError;

/// Top-level server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: String,

    /// How often (in seconds) expired sessions are purged from the store.
    /// 0 disables the sweeper.
    pub sweep_interval_secs: u64,

    /// Where a successful login lands when no `next` was given.
    pub home_path: String,

    /// Session lifetime.
    pub session: SessionConfig,

    /// Paths and cookie names.
    pub access: AccessConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            sweep_interval_secs: 300,
            home_path: "/dashboard".into(),
            session: SessionConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    /// Returns [`FleetgateError::Config`] if the text is not valid TOML for
    /// this structure.
    pub fn from_toml_str(text: &str) -> Result<Self, FleetgateError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FleetgateError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks the settings that could only be wrong by misconfiguration.
    pub fn validate(&self) -> Result<(), FleetgateError> {
        self.access.validate()?;
        let home = &self.home_path;
        if !home.starts_with('/') || !home.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(AccessError::RelativePath {
                field: "home_path",
                value: self.home_path.clone(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_empty_gives_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_from_toml_str_partial_override() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind = "0.0.0.0:8080"

            [session]
            ttl_secs = 60

            [access]
            scope_cookie = "kiosk"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.access.scope_cookie, "kiosk");
        // Untouched keys keep their defaults.
        assert_eq!(config.access.session_cookie, "fleet_session");
        assert_eq!(config.sweep_interval_secs, 300);
    }

    #[test]
    fn test_from_toml_str_wrong_type_returns_config_error() {
        let result = ServerConfig::from_toml_str("sweep_interval_secs = \"often\"");
        assert!(matches!(result, Err(FleetgateError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_access_config() {
        let mut config = ServerConfig::default();
        config.access.forbidden_path = "forbidden".into();
        assert!(matches!(config.validate(), Err(FleetgateError::Access(_))));
    }

    #[test]
    fn test_validate_rejects_home_path_with_newline() {
        let config = ServerConfig {
            home_path: "/dashboard\r\nX-Injected: 1".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(FleetgateError::Access(_))));
    }

    #[test]
    fn test_from_toml_str_cookie_secure_can_be_disabled() {
        let config = ServerConfig::from_toml_str("[access]\ncookie_secure = false").unwrap();
        assert!(!config.access.cookie_secure);
        assert!(ServerConfig::default().access.cookie_secure);
    }
}
