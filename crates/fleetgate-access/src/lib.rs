//! Access control for Fleetgate.
//!
//! Every protected request passes two checks:
//!
//! 1. **Edge pre-filter** ([`EdgeFilter`]): no store access at all. Public
//!    paths pass; every other path needs the session cookie to be present.
//!    Requests without one are sent to the login page immediately.
//! 2. **Access gate** ([`AccessGate`]): resolves the current user, re-reads
//!    their grants through the [`PermissionResolver`], and decides.
//!
//! The decision itself is a pure function ([`decide`]) of the grants, the
//! required capability key, and the kiosk scope cookie, so the two rules
//! that are easiest to break (case-insensitive keys and the kiosk
//! carve-out) can be tested without any store.
//!
//! # Key types
//!
//! - [`AccessConfig`]: paths and cookie names
//! - [`RequestContext`]: everything the gate needs from one request
//! - [`EdgeVerdict`]: continue, or redirect to login

mod config;
mod edge;
mod error;
mod gate;
mod policy;

pub use config::AccessConfig;
pub use edge::{EdgeFilter, EdgeVerdict, login_location};
pub use error::AccessError;
pub use gate::{AccessGate, PermissionResolver, RequestContext};
pub use policy::{
    KIOSK_KEY, KIOSK_SENTINEL, decide, has_capability, kiosk_allows,
};

pub use fleetgate_protocol::normalize_key;
