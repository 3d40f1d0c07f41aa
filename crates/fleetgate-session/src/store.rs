//! The read interface the access layer consumes.
//!
//! Fleetgate never talks to a database directly. It reads users and
//! sessions through [`IdentityStore`], so production can back it with the
//! application's relational tables while tests inject any
//! (token, store-state) pair they like, including a store that is down.

use chrono::{DateTime, Utc};
use fleetgate_protocol::{Grants, UserId};

use crate::{SessionRow, StoreError};

/// Read-only access to the sessions and users tables.
///
/// # Contract
///
/// - "Not found" is `Ok(None)`: an unknown token, an expired token, or a
///   deleted user. It is the normal unauthenticated signal, not an error.
/// - `Err` means the store itself failed (unreachable, corrupt row).
///
/// Callers treat both the same way (deny), but implementations must keep
/// them apart so failures are visible in logs.
///
/// `Send + Sync + 'static` because one store is shared by every request
/// task for the lifetime of the server.
pub trait IdentityStore: Send + Sync + 'static {
    /// Looks up a session token joined with its user row.
    ///
    /// Returns `Ok(None)` if the token is unknown or its session has
    /// expired as of `now`.
    fn lookup_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<SessionRow>, StoreError>>
    + Send;

    /// Reads the user's current role and permission list.
    ///
    /// This is always a fresh read of the persisted row. Returns
    /// `Ok(None)` if the user no longer exists.
    fn load_grants(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Grants>, StoreError>>
    + Send;
}
