//! Session management for Fleetgate.
//!
//! This crate owns everything between an opaque cookie value and a
//! resolved user:
//!
//! 1. **Storage**: the [`IdentityStore`] trait the rest of the system
//!    reads through, and [`MemoryStore`] / [`SharedStore`], the in-process
//!    implementation of the users and sessions tables.
//! 2. **Resolution**: [`resolve_current_user`], which turns a session
//!    token into a [`UserIdentity`](fleetgate_protocol::UserIdentity) or
//!    nothing at all.
//! 3. **Login**: the [`Authenticator`] trait and Argon2id
//!    [`PasswordHash`]es, used when a session is first issued.
//!
//! # How it fits in the stack
//!
//! ```text
//! Access Layer (above)  ← asks "who is this?" and "what may they do?"
//!     ↕
//! Session Layer (this crate)  ← tokens, expiry, user rows
//!     ↕
//! Protocol Layer (below)  ← UserId, Role, PermissionSet, Codec
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod memory;
mod resolver;
mod session;
mod store;

pub use auth::{Authenticator, PasswordHash};
pub use error::{SessionError, StoreError};
pub use memory::{MemoryStore, NewUser, SeedUser, SharedStore};
pub use resolver::resolve_current_user;
pub use session::{Session, SessionConfig, SessionRow};
pub use store::IdentityStore;
