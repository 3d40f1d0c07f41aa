//! Error types for the session layer.

use fleetgate_protocol::{ProtocolError, UserId};

/// Failures of the backing identity store.
///
/// The store distinguishes "not found" (returned as `Ok(None)`, never as
/// an error) from these genuine failures. The resolvers above map both to
/// the same fail-closed outcome, but the distinction is kept here so the
/// failure can be logged for what it is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or did not answer.
    #[error("identity store unavailable: {0}")]
    Unavailable(String),

    /// A user row exists but its permission column cannot be decoded.
    #[error("corrupt permission column for user {user_id}: {source}")]
    Corrupt {
        user_id: UserId,
        #[source]
        source: ProtocolError,
    },
}

/// Errors that can occur while managing users and sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login failed: unknown username, no password set, or wrong password.
    /// The message is for logs only and never says which of those it was.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No user row exists with this id.
    #[error("user {0} not found")]
    NotFound(UserId),

    /// A user with this username already exists.
    #[error("username {0:?} is already taken")]
    AlreadyExists(String),

    /// A password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The session token is not known to the store.
    #[error("invalid session token")]
    InvalidToken,

    /// A stored value could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
