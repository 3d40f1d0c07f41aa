//! Error types for the protocol layer.
//!
//! Each crate in Fleetgate defines its own error enum. A `ProtocolError`
//! always means a value could not be converted: bytes that are not valid
//! JSON, or a string that names no known role.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: a truncated permission column, a seed file with a
    /// missing field, or a role spelled as a number.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A string could not be parsed into a protocol value, e.g. a role
    /// name that is neither `admin` nor `standard`.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
