//! The in-process identity store: users and sessions tables in memory.
//!
//! This is the store the demo portal and the test suites run against. It
//! is responsible for:
//! - Registering users and their role/permission rows
//! - Issuing sessions on login and deleting them on logout
//! - Revoking every session of a user whose password or role changed
//! - Purging sessions whose expiry has passed
//! - Answering the two [`IdentityStore`] reads
//!
//! # Concurrency note
//!
//! `MemoryStore` is NOT thread-safe by itself; it uses plain `HashMap`s
//! and `&mut self` mutators. [`SharedStore`] wraps it in an
//! `Arc<RwLock<_>>` so request tasks can read concurrently while login,
//! logout, and the sweeper take the write lock briefly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetgate_protocol::{
    Codec, Grants, JsonCodec, PermissionSet, Role, UserId, UserIdentity,
};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    Authenticator, IdentityStore, PasswordHash, Session, SessionConfig,
    SessionError, SessionRow, StoreError,
};

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub permissions: PermissionSet,
}

/// One entry of a JSON seed file.
///
/// Exactly one of `password` (plain text, for local demos) or
/// `password_hash` (an Argon2id PHC string) should be given. A user
/// with neither can never log in.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: PermissionSet,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// One row of the users table.
///
/// `permissions` holds the encoded column exactly as a relational table
/// would, and is decoded on every read.
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    role: Role,
    permissions: Vec<u8>,
    password: Option<PasswordHash>,
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Users and sessions, kept in memory.
///
/// ## Session lifecycle
///
/// ```text
/// create_session() ──→ [live] ──(expires_at passes)──→ [expired] ──→ purge_expired()
///                        │
///                        ├──(destroy_session: logout)──→ gone
///                        └──(revoke_user_sessions: password/role change)──→ gone
/// ```
///
/// An expired session that has not been purged yet is invisible to
/// lookups; purging only frees the memory.
pub struct MemoryStore {
    /// User rows, keyed by id.
    users: HashMap<UserId, UserRow>,

    /// Index from lower-cased username to user id. Kept in sync with
    /// `users`.
    usernames: HashMap<String, UserId>,

    /// Sessions, keyed by token.
    sessions: HashMap<String, Session>,

    /// Session lifetime.
    config: SessionConfig,

    /// Encodes the permission column.
    codec: JsonCodec,

    next_user_id: u64,
}

impl MemoryStore {
    /// Creates an empty store with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            users: HashMap::new(),
            usernames: HashMap::new(),
            sessions: HashMap::new(),
            config,
            codec: JsonCodec,
            next_user_id: 1,
        }
    }

    /// Creates a store populated from a JSON seed file (an array of
    /// [`SeedUser`]).
    ///
    /// # Errors
    /// - [`SessionError::Protocol`]: the file is not a valid seed array
    /// - [`SessionError::AlreadyExists`]: two entries share a username
    /// - [`SessionError::AuthFailed`]: a `password_hash` is malformed
    /// - [`SessionError::Hashing`]: a plain `password` could not be hashed
    pub fn from_seed(
        config: SessionConfig,
        data: &[u8],
    ) -> Result<Self, SessionError> {
        let mut store = Self::new(config);
        let seed: Vec<SeedUser> = store.codec.decode(data)?;

        for entry in seed {
            let password = match (&entry.password_hash, &entry.password) {
                (Some(encoded), _) => Some(PasswordHash::parse(encoded)?),
                (None, Some(plain)) => Some(PasswordHash::new(plain)?),
                (None, None) => None,
            };
            let user_id = store.add_user(NewUser {
                username: entry.username,
                email: entry.email,
                role: entry.role,
                permissions: entry.permissions,
            })?;
            if let Some(hash) = password {
                store.set_password_hash(user_id, hash)?;
            }
        }

        tracing::info!(users = store.users.len(), "identity store seeded");
        Ok(store)
    }

    /// The configured session lifetime.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -- Users ------------------------------------------------------------

    /// Registers a user and returns the new id.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyExists`] if the username (compared
    /// case-insensitively) is taken.
    pub fn add_user(&mut self, user: NewUser) -> Result<UserId, SessionError> {
        let key = user.username.to_lowercase();
        if self.usernames.contains_key(&key) {
            return Err(SessionError::AlreadyExists(user.username));
        }

        let permissions = self.codec.encode(&user.permissions)?;
        let id = UserId(self.next_user_id);
        self.next_user_id += 1;

        self.usernames.insert(key, id);
        self.users.insert(
            id,
            UserRow {
                id,
                username: user.username,
                email: user.email,
                role: user.role,
                permissions,
                password: None,
            },
        );

        tracing::info!(user_id = %id, role = %user.role, "user added");
        Ok(id)
    }

    /// Changes a user's role.
    ///
    /// Existing sessions stay valid; the new role applies from the next
    /// request because grants are re-read every time.
    pub fn set_role(
        &mut self,
        user_id: UserId,
        role: Role,
    ) -> Result<(), SessionError> {
        let row = self.user_mut(user_id)?;
        row.role = role;
        tracing::info!(%user_id, %role, "role changed");
        Ok(())
    }

    /// Replaces a user's permission list.
    pub fn set_permissions(
        &mut self,
        user_id: UserId,
        permissions: &PermissionSet,
    ) -> Result<(), SessionError> {
        let encoded = self.codec.encode(permissions)?;
        let row = self.user_mut(user_id)?;
        row.permissions = encoded;
        tracing::info!(%user_id, count = permissions.len(), "permissions changed");
        Ok(())
    }

    /// Sets a new password and revokes every session of the user.
    pub fn set_password(
        &mut self,
        user_id: UserId,
        password: &str,
    ) -> Result<(), SessionError> {
        self.set_password_hash(user_id, PasswordHash::new(password)?)
    }

    fn set_password_hash(
        &mut self,
        user_id: UserId,
        hash: PasswordHash,
    ) -> Result<(), SessionError> {
        let row = self.user_mut(user_id)?;
        row.password = Some(hash);
        let revoked = self.revoke_user_sessions(user_id);
        tracing::info!(%user_id, revoked, "password changed");
        Ok(())
    }

    /// Deletes a user and every session they hold.
    pub fn remove_user(&mut self, user_id: UserId) -> Result<(), SessionError> {
        let row = self
            .users
            .remove(&user_id)
            .ok_or(SessionError::NotFound(user_id))?;
        self.usernames.remove(&row.username.to_lowercase());
        self.revoke_user_sessions(user_id);
        tracing::info!(%user_id, "user removed");
        Ok(())
    }

    /// Checks a username/password pair.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] for an unknown user, a user
    /// without a password, or a wrong password. The three cases are
    /// indistinguishable to the caller.
    pub fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserId, SessionError> {
        let row = self
            .usernames
            .get(&username.to_lowercase())
            .and_then(|id| self.users.get(id));

        match row.and_then(|r| r.password.as_ref().map(|p| (r.id, p))) {
            Some((id, hash)) if hash.verify(password) => Ok(id),
            _ => Err(SessionError::AuthFailed("invalid credentials".into())),
        }
    }

    /// Reads a user's identity, decoding the permission column.
    ///
    /// # Errors
    /// Returns [`StoreError::Corrupt`] if the column cannot be decoded.
    pub fn identity(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserIdentity>, StoreError> {
        let Some(row) = self.users.get(&user_id) else {
            return Ok(None);
        };
        Ok(Some(UserIdentity {
            id: row.id,
            username: row.username.clone(),
            email: row.email.clone(),
            role: row.role,
            permissions: self.decode_permissions(row)?,
        }))
    }

    /// Reads a user's role and freshly decoded permission list.
    pub fn grants(&self, user_id: UserId) -> Result<Option<Grants>, StoreError> {
        let Some(row) = self.users.get(&user_id) else {
            return Ok(None);
        };
        Ok(Some(Grants {
            role: row.role,
            permissions: self.decode_permissions(row)?,
        }))
    }

    // -- Sessions ---------------------------------------------------------

    /// Issues a new session for a user, expiring `ttl` after `now`.
    ///
    /// A user may hold several sessions at once (one per browser).
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the user does not exist.
    pub fn create_session(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        if !self.users.contains_key(&user_id) {
            return Err(SessionError::NotFound(user_id));
        }

        let mut token = generate_token();
        while self.sessions.contains_key(&token) {
            token = generate_token();
        }

        let session = Session {
            token: token.clone(),
            user_id,
            expires_at: now + self.config.ttl(),
        };
        self.sessions.insert(token, session.clone());

        tracing::info!(%user_id, expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    /// Deletes a session (logout).
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidToken`] if the token is unknown.
    pub fn destroy_session(&mut self, token: &str) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(token)
            .ok_or(SessionError::InvalidToken)?;
        tracing::info!(user_id = %session.user_id, "session destroyed");
        Ok(session)
    }

    /// Deletes every session belonging to a user. Returns how many were
    /// removed.
    pub fn revoke_user_sessions(&mut self, user_id: UserId) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.user_id != user_id);
        let revoked = before - self.sessions.len();
        if revoked > 0 {
            tracing::info!(%user_id, revoked, "sessions revoked");
        }
        revoked
    }

    /// Removes every session that is no longer live at `now`.
    ///
    /// Returns the owners of the removed sessions (one entry per session).
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<UserId> {
        let mut purged = Vec::new();
        self.sessions.retain(|_, session| {
            if session.is_live(now) {
                true
            } else {
                purged.push(session.user_id);
                false
            }
        });
        if !purged.is_empty() {
            tracing::debug!(count = purged.len(), "expired sessions purged");
        }
        purged
    }

    /// Looks up a token joined with its user.
    ///
    /// Returns `Ok(None)` for unknown tokens, sessions that are not live
    /// at `now`, and sessions whose user has been removed.
    pub fn lookup(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRow>, StoreError> {
        let Some(session) = self.sessions.get(token) else {
            return Ok(None);
        };
        if !session.is_live(now) {
            return Ok(None);
        }
        Ok(self.identity(session.user_id)?.map(|identity| SessionRow {
            session: session.clone(),
            identity,
        }))
    }

    /// Number of sessions held (live or not yet purged).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    // -- Helpers ----------------------------------------------------------

    fn user_mut(&mut self, user_id: UserId) -> Result<&mut UserRow, SessionError> {
        self.users
            .get_mut(&user_id)
            .ok_or(SessionError::NotFound(user_id))
    }

    fn decode_permissions(&self, row: &UserRow) -> Result<PermissionSet, StoreError> {
        self.codec
            .decode(&row.permissions)
            .map_err(|source| StoreError::Corrupt {
                user_id: row.id,
                source,
            })
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// SharedStore
// ---------------------------------------------------------------------------

/// A [`MemoryStore`] shared across request tasks.
///
/// Cloning is cheap: every clone points at the same store.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<MemoryStore>>,
}

impl SharedStore {
    /// Wraps a store for sharing.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquires the read lock.
    pub async fn read(&self) -> RwLockReadGuard<'_, MemoryStore> {
        self.inner.read().await
    }

    /// Acquires the write lock.
    pub async fn write(&self) -> RwLockWriteGuard<'_, MemoryStore> {
        self.inner.write().await
    }
}

impl IdentityStore for SharedStore {
    async fn lookup_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRow>, StoreError> {
        self.inner.read().await.lookup(token, now)
    }

    async fn load_grants(&self, user_id: UserId) -> Result<Option<Grants>, StoreError> {
        self.inner.read().await.grants(user_id)
    }
}

impl Authenticator for SharedStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserId, SessionError> {
        self.inner.read().await.verify_password(username, password)
    }
}

// =========================================================================
// Tests
// =========================================================================
