//! Shared vocabulary for Fleetgate.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identity** ([`UserId`], [`Role`], [`UserIdentity`]): who is asking.
//! - **Capabilities** ([`CapabilityKey`], [`PermissionSet`], [`Grants`]) -
//!   what areas of the fleet application they may enter.
//! - **Outcomes** ([`AccessOutcome`], [`AccessState`]): the only three
//!   externally observable results of an authorization check.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how stored records
//!   (permission columns, seed files) are converted to/from bytes.
//!
//! # Architecture
//!
//! ```text
//! Server (HTTP)  →  Access (gate, edge filter)  →  Session (store, resolver)
//!                              ↘                      ↙
//!                          Protocol (this crate)
//! ```
//!
//! The protocol layer knows nothing about cookies, stores, or requests.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AccessOutcome, AccessState, CapabilityKey, Grants, PermissionSet, Role,
    UserId, UserIdentity, normalize_key,
};
