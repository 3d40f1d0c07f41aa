//! The access gate: the full per-request authorization check.
//!
//! ```text
//! RequestContext ──→ resolve_current_user ──→ PermissionResolver ──→ decide
//!                         │ (none / error)          │ (none / error)     │
//!                         ▼                         ▼                    ▼
//!                    Login { next }            Login { next }   Allow / Forbidden
//! ```
//!
//! Every step is a fresh read. There is no decision cache, no retry, and
//! no state kept between calls.

use chrono::{DateTime, Utc};
use fleetgate_protocol::{AccessOutcome, AccessState, Grants, UserIdentity};
use fleetgate_session::{IdentityStore, resolve_current_user};

use crate::{AccessConfig, decide};

// ---------------------------------------------------------------------------
// RequestContext
// ---------------------------------------------------------------------------

/// What the gate needs to know about one request.
///
/// Built explicitly by the caller (the HTTP layer, or a test) instead of
/// being read from ambient state, so any combination of cookies and clock
/// can be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The requested path, used as `next` on a login redirect.
    pub path: String,

    /// Value of the session cookie, if sent.
    pub session_token: Option<String>,

    /// Value of the kiosk scope cookie, if sent.
    pub scope_cookie: Option<String>,

    /// The instant sessions are checked against.
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// A context with no cookies.
    pub fn new(path: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            session_token: None,
            scope_cookie: None,
            now,
        }
    }

    /// Sets the session cookie value.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Sets the kiosk scope cookie value.
    pub fn with_scope(mut self, value: impl Into<String>) -> Self {
        self.scope_cookie = Some(value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// PermissionResolver
// ---------------------------------------------------------------------------

/// Turns a resolved identity into its current grants.
///
/// The grants are always re-read from the store, never taken from the
/// identity, so a role or permission edit applies on the very next
/// request.
pub struct PermissionResolver;

impl PermissionResolver {
    /// Reads the user's current grants.
    ///
    /// Returns `None` if the user no longer exists or the store fails.
    /// An admin's grants come back with an empty permission list: the
    /// list is never consulted for admins.
    pub async fn resolve<S: IdentityStore>(store: &S, identity: &UserIdentity) -> Option<Grants> {
        match store.load_grants(identity.id).await {
            Ok(Some(grants)) if grants.role.is_admin() => Some(Grants::admin()),
            Ok(Some(grants)) => Some(grants),
            Ok(None) => {
                tracing::debug!(user_id = %identity.id, "user vanished after session lookup");
                None
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %identity.id,
                    error = %e,
                    "grant lookup failed, treating as anonymous"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AccessGate
// ---------------------------------------------------------------------------

/// The per-request authorization check.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    config: AccessConfig,
}

impl AccessGate {
    /// Creates a gate with the given config.
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }

    /// The gate's config.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Checks whether the request in `ctx` may enter the area `key`.
    ///
    /// Never fails: a missing, unknown, or expired session, a vanished
    /// user, and a store failure all come back as
    /// [`AccessOutcome::Login`]. An authenticated user without the
    /// capability gets [`AccessOutcome::Forbidden`].
    pub async fn check<S: IdentityStore>(
        &self,
        store: &S,
        ctx: &RequestContext,
        key: &str,
    ) -> AccessOutcome {
        let identity = resolve_current_user(store, ctx.session_token.as_deref(), ctx.now).await;

        let grants = match &identity {
            Some(identity) => PermissionResolver::resolve(store, identity).await,
            None => None,
        };

        let state = decide(grants.as_ref(), key, ctx.scope_cookie.as_deref());

        match &identity {
            Some(identity) => {
                tracing::debug!(user_id = %identity.id, %key, %state, "access decided");
            }
            None => tracing::debug!(%key, %state, "access decided"),
        }

        match state {
            AccessState::Allowed => AccessOutcome::Allow,
            AccessState::Denied => AccessOutcome::Forbidden,
            AccessState::Unauthenticated => AccessOutcome::Login {
                next: ctx.path.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use fleetgate_protocol::{PermissionSet, Role, UserId};
    use fleetgate_session::{MemoryStore, NewUser, SessionConfig, SharedStore};

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
    }

    async fn store_with(role: Role, perms: &[&str]) -> (SharedStore, UserId, String) {
        let mut store = MemoryStore::new(SessionConfig { ttl_secs: 60 });
        let id = store
            .add_user(NewUser {
                username: "user".into(),
                email: "user@fleet.test".into(),
                role,
                permissions: perms.iter().collect(),
            })
            .unwrap();
        let token = store.create_session(id, t0()).unwrap().token;
        (SharedStore::new(store), id, token)
    }

    #[tokio::test]
    async fn test_permission_resolver_admin_drops_list() {
        let (store, id, _) = store_with(Role::Admin, &["/vehicles"]).await;
        let identity = store.read().await.identity(id).unwrap().unwrap();

        let grants = PermissionResolver::resolve(&store, &identity).await.unwrap();

        assert_eq!(grants, Grants::admin());
    }

    #[tokio::test]
    async fn test_permission_resolver_vanished_user_returns_none() {
        let (store, id, _) = store_with(Role::Standard, &[]).await;
        let identity = store.read().await.identity(id).unwrap().unwrap();
        store.write().await.remove_user(id).unwrap();

        assert!(PermissionResolver::resolve(&store, &identity).await.is_none());
    }

    #[tokio::test]
    async fn test_check_picks_up_permission_edit_on_next_request() {
        let (store, id, token) = store_with(Role::Standard, &["/vehicles"]).await;
        let gate = AccessGate::default();
        let ctx = RequestContext::new("/reports", t0()).with_session(token);

        assert_eq!(gate.check(&store, &ctx, "/reports").await, AccessOutcome::Forbidden);

        let perms: PermissionSet = ["/vehicles", "/reports"].into_iter().collect();
        store.write().await.set_permissions(id, &perms).unwrap();

        assert_eq!(gate.check(&store, &ctx, "/reports").await, AccessOutcome::Allow);
    }

    #[tokio::test]
    async fn test_check_picks_up_demotion_on_next_request() {
        let (store, id, token) = store_with(Role::Admin, &[]).await;
        let gate = AccessGate::default();
        let ctx = RequestContext::new("/settings", t0()).with_session(token);

        assert_eq!(gate.check(&store, &ctx, "/settings").await, AccessOutcome::Allow);

        store.write().await.set_role(id, Role::Standard).unwrap();

        assert_eq!(gate.check(&store, &ctx, "/settings").await, AccessOutcome::Forbidden);
    }

    #[tokio::test]
    async fn test_check_expired_session_carries_next() {
        let (store, _, token) = store_with(Role::Admin, &[]).await;
        let gate = AccessGate::default();
        let ctx = RequestContext::new("/alerts", t0() + Duration::seconds(61)).with_session(token);

        assert_eq!(
            gate.check(&store, &ctx, "/alerts").await,
            AccessOutcome::Login {
                next: "/alerts".into()
            }
        );
    }
}
