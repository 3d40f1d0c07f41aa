//! Session types: the rows of the sessions table.
//!
//! A session is the server's record that a browser has logged in. It
//! tracks:
//! - WHO logged in (`UserId`)
//! - WHICH opaque token the browser holds in its cookie
//! - WHEN the session stops being valid (`expires_at`)
//!
//! There is no sliding expiration. A session is valid until `expires_at`
//! and not a moment after, however often it is used.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use fleetgate_protocol::{UserId, UserIdentity};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Upper bound on a configured session lifetime (about ten years).
pub const MAX_TTL_SECS: u64 = 10 * 366 * 24 * 60 * 60;

/// Configuration for session lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long (in seconds) a session stays valid after login.
    ///
    /// Default: 8 hours, one working shift.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 8 * 60 * 60,
        }
    }
}

impl SessionConfig {
    /// The lifetime as a chrono `Duration`, capped at [`MAX_TTL_SECS`].
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs.min(MAX_TTL_SECS) as i64)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One row of the sessions table.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The opaque token stored in the browser's session cookie.
    /// A 32-character hex string (128 bits of randomness).
    pub token: String,

    /// Which user this session belongs to.
    pub user_id: UserId,

    /// Wall-clock instant after which the session is dead.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` if `expires_at` is strictly after `now`.
    ///
    /// A session that expires exactly at `now` is already dead.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Tokens are credentials, so `Debug` never prints one.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionRow
// ---------------------------------------------------------------------------

/// The result of looking up a token: the session joined with its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub session: Session,
    pub identity: UserIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        Session {
            token: "0123456789abcdef0123456789abcdef".into(),
            user_id: UserId(1),
            expires_at,
        }
    }

    #[test]
    fn test_is_live_future_expiry_returns_true() {
        let now = Utc::now();
        let session = session_expiring_at(now + Duration::seconds(1));
        assert!(session.is_live(now));
    }

    #[test]
    fn test_is_live_exact_expiry_returns_false() {
        // Strictly in the future: the boundary instant is already expired.
        let now = Utc::now();
        let session = session_expiring_at(now);
        assert!(!session.is_live(now));
    }

    #[test]
    fn test_is_live_past_expiry_returns_false() {
        let now = Utc::now();
        let session = session_expiring_at(now - Duration::minutes(5));
        assert!(!session.is_live(now));
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = session_expiring_at(Utc::now());
        let printed = format!("{session:?}");
        assert!(!printed.contains("0123456789abcdef"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_session_config_default_is_one_shift() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_secs, 28_800);
        assert_eq!(config.ttl(), Duration::hours(8));
    }

    #[test]
    fn test_session_config_ttl_is_capped() {
        let config = SessionConfig { ttl_secs: u64::MAX };
        assert_eq!(config.ttl(), Duration::days(10 * 366));
    }
}
