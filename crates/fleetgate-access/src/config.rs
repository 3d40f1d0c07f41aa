//! Access-control configuration.

use serde::{Deserialize, Serialize};

use crate::AccessError;

// ---------------------------------------------------------------------------
// AccessConfig
// ---------------------------------------------------------------------------

/// Paths and cookie names used by the edge filter and the access gate.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Where unauthenticated requests are sent. Always public.
    pub login_path: String,

    /// Where authenticated-but-unauthorized requests are sent.
    pub forbidden_path: String,

    /// Name of the cookie carrying the session token.
    pub session_cookie: String,

    /// Name of the kiosk scope cookie. Only ever consulted for the
    /// mobile fueling page.
    pub scope_cookie: String,

    /// Whether the session cookie carries the `Secure` attribute. Only
    /// turn this off for a plain-HTTP local setup.
    pub cookie_secure: bool,

    /// Path prefixes the edge filter lets through without a session
    /// cookie: the login flow, static assets, the public API namespace.
    ///
    /// Matching is per path segment: `/static` covers `/static` and
    /// `/static/app.css` but not `/statics`.
    pub public_prefixes: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".into(),
            forbidden_path: "/forbidden".into(),
            session_cookie: "fleet_session".into(),
            scope_cookie: "fleet_scope".into(),
            cookie_secure: true,
            public_prefixes: vec![
                "/login".into(),
                "/api/auth".into(),
                "/api/public".into(),
                "/static".into(),
                "/favicon.ico".into(),
            ],
        }
    }
}

impl AccessConfig {
    /// Checks the configuration for deployment mistakes.
    ///
    /// # Errors
    /// - [`AccessError::RelativePath`]: a path or prefix lacks a leading `/`
    /// - [`AccessError::InvalidCookieName`]: empty or non-token cookie name
    /// - [`AccessError::CookieNameClash`]: both cookies share a name
    pub fn validate(&self) -> Result<(), AccessError> {
        check_absolute("login_path", &self.login_path)?;
        check_absolute("forbidden_path", &self.forbidden_path)?;
        for prefix in &self.public_prefixes {
            check_absolute("public_prefixes", prefix)?;
        }

        check_cookie_name("session_cookie", &self.session_cookie)?;
        check_cookie_name("scope_cookie", &self.scope_cookie)?;
        if self.session_cookie == self.scope_cookie {
            return Err(AccessError::CookieNameClash);
        }
        Ok(())
    }
}

/// Paths end up in `Location` headers, so they must be visible ASCII.
fn check_absolute(field: &'static str, value: &str) -> Result<(), AccessError> {
    if value.starts_with('/') && value.bytes().all(|b| b.is_ascii_graphic()) {
        Ok(())
    } else {
        Err(AccessError::RelativePath {
            field,
            value: value.to_string(),
        })
    }
}

/// Cookie names are HTTP tokens: visible ASCII minus separators.
fn check_cookie_name(field: &'static str, value: &str) -> Result<(), AccessError> {
    let valid = !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        });
    if valid {
        Ok(())
    } else {
        Err(AccessError::InvalidCookieName {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AccessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.forbidden_path, "/forbidden");
        assert_ne!(config.session_cookie, config.scope_cookie);
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_validate_path_with_control_character_rejected() {
        for bad in ["/login\n", "/for bidden", "/login\t"] {
            let config = AccessConfig {
                forbidden_path: bad.into(),
                ..AccessConfig::default()
            };
            assert!(
                matches!(
                    config.validate(),
                    Err(AccessError::RelativePath { field: "forbidden_path", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_relative_login_path_rejected() {
        let config = AccessConfig {
            login_path: "login".into(),
            ..AccessConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AccessError::RelativePath { field: "login_path", .. })
        ));
    }

    #[test]
    fn test_validate_relative_prefix_rejected() {
        let mut config = AccessConfig::default();
        config.public_prefixes.push("assets".into());
        assert!(matches!(
            config.validate(),
            Err(AccessError::RelativePath { field: "public_prefixes", .. })
        ));
    }

    #[test]
    fn test_validate_bad_cookie_names_rejected() {
        for bad in ["", "has space", "semi;colon", "eq=uals"] {
            let config = AccessConfig {
                session_cookie: bad.into(),
                ..AccessConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(AccessError::InvalidCookieName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_same_cookie_names_rejected() {
        let config = AccessConfig {
            session_cookie: "sid".into(),
            scope_cookie: "sid".into(),
            ..AccessConfig::default()
        };
        assert!(matches!(config.validate(), Err(AccessError::CookieNameClash)));
    }
}
