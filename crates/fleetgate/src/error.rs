//! Unified error type for Fleetgate.

use fleetgate_access::AccessError;
use fleetgate_protocol::ProtocolError;
use fleetgate_session::{SessionError, StoreError};

/// Top-level error that wraps all crate-specific errors.
///
/// These only surface while starting or configuring the server. Once a
/// request is being served, every failure is mapped to a login or
/// forbidden redirect instead.
#[derive(Debug, thiserror::Error)]
pub enum FleetgateError {
    /// A protocol-level error (encode, decode, invalid value).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (seed file, users, sessions).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The identity store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The access configuration is invalid.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Binding the listener or serving failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML config file could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}
