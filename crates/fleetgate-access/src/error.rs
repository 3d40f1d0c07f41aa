//! Error types for the access layer.
//!
//! Authorization itself never errors: every failure becomes a login or
//! forbidden outcome. The only errors here come from a misconfigured
//! deployment, caught once at startup.

/// Errors that can occur while configuring access control.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// A path setting does not start with `/`, or contains whitespace,
    /// control or non-ASCII characters.
    #[error("{field} must be an absolute path of visible ASCII, got {value:?}")]
    RelativePath { field: &'static str, value: String },

    /// A cookie name is empty or contains characters not allowed in a
    /// cookie name.
    #[error("invalid cookie name for {field}: {value:?}")]
    InvalidCookieName { field: &'static str, value: String },

    /// The session and scope cookies share a name, which would let the
    /// kiosk sentinel stand in for a session token.
    #[error("session and scope cookies must have different names")]
    CookieNameClash,
}
