//! Current-user resolution: session token in, identity (or nothing) out.

use chrono::{DateTime, Utc};
use fleetgate_protocol::UserIdentity;

use crate::IdentityStore;

/// Resolves the user behind a session token.
///
/// Returns `None` when:
/// - there is no token (or it is empty),
/// - the store does not know the token,
/// - the session's `expires_at` is not strictly after `now`,
/// - the store fails.
///
/// The last case is the fail-closed contract: an unreachable store must
/// look exactly like an anonymous request, never like a logged-in one.
/// The failure is logged at `warn` and goes no further.
///
/// Read-only. Every call compares against the `now` it is given; nothing
/// is extended or refreshed.
pub async fn resolve_current_user<S: IdentityStore>(
    store: &S,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Option<UserIdentity> {
    let token = token.filter(|t| !t.is_empty())?;

    match store.lookup_session(token, now).await {
        Ok(Some(row)) => {
            // Stores are not trusted to apply expiry or match exactly.
            if row.session.token != token || !row.session.is_live(now) {
                tracing::debug!(
                    user_id = %row.identity.id,
                    "store returned a session that is not live"
                );
                return None;
            }
            Some(row.identity)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "session lookup failed, treating as anonymous");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use fleetgate_protocol::{Grants, Role, UserId};

    use super::*;
    use crate::{
        MemoryStore, NewUser, Session, SessionConfig, SessionRow, SharedStore,
        StoreError,
    };

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    /// Store with one standard user and one live session. Returns the
    /// store and the session token.
    fn seeded() -> (SharedStore, String) {
        let mut store = MemoryStore::new(SessionConfig { ttl_secs: 600 });
        let id = store
            .add_user(NewUser {
                username: "dispatch".into(),
                email: "dispatch@fleet.test".into(),
                role: Role::Standard,
                permissions: ["/vehicles"].into_iter().collect(),
            })
            .unwrap();
        let token = store.create_session(id, t0()).unwrap().token;
        (SharedStore::new(store), token)
    }

    /// Every call fails as if the database were down.
    struct DownStore;

    impl IdentityStore for DownStore {
        async fn lookup_session(
            &self,
            _token: &str,
            _now: DateTime<Utc>,
        ) -> Result<Option<SessionRow>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn load_grants(&self, _user_id: UserId) -> Result<Option<Grants>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    /// Returns whatever session it was built with, ignoring expiry.
    struct SloppyStore(SessionRow);

    impl IdentityStore for SloppyStore {
        async fn lookup_session(
            &self,
            _token: &str,
            _now: DateTime<Utc>,
        ) -> Result<Option<SessionRow>, StoreError> {
            Ok(Some(self.0.clone()))
        }

        async fn load_grants(&self, _user_id: UserId) -> Result<Option<Grants>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_resolve_live_token_returns_identity() {
        let (store, token) = seeded();

        let identity = resolve_current_user(&store, Some(&token), t0()).await;

        assert_eq!(identity.map(|i| i.username), Some("dispatch".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_missing_token_returns_none() {
        let (store, _) = seeded();
        assert!(resolve_current_user(&store, None, t0()).await.is_none());
        assert!(resolve_current_user(&store, Some(""), t0()).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_unknown_token_returns_none() {
        let (store, _) = seeded();
        let identity = resolve_current_user(&store, Some("ffffffff"), t0()).await;
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_resolve_expired_token_returns_none() {
        let (store, token) = seeded();
        let later = t0() + Duration::seconds(601);

        // The token is still in the store, just not live.
        assert_eq!(store.read().await.len(), 1);
        assert!(resolve_current_user(&store, Some(&token), later).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_store_down_returns_none() {
        let identity = resolve_current_user(&DownStore, Some("abc"), t0()).await;
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_resolve_store_returning_expired_row_returns_none() {
        let row = SessionRow {
            session: Session {
                token: "abc".into(),
                user_id: UserId(1),
                expires_at: t0() - Duration::seconds(1),
            },
            identity: fleetgate_protocol::UserIdentity {
                id: UserId(1),
                username: "ghost".into(),
                email: "ghost@fleet.test".into(),
                role: Role::Admin,
                permissions: Default::default(),
            },
        };

        let identity = resolve_current_user(&SloppyStore(row), Some("abc"), t0()).await;

        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_resolve_after_logout_returns_none() {
        let (store, token) = seeded();
        store.write().await.destroy_session(&token).unwrap();

        assert!(resolve_current_user(&store, Some(&token), t0()).await.is_none());
    }
}
