//! # Fleetgate
//!
//! Access control and session validation for the fleet-management web app.
//!
//! Every page of the app is a protected area named by a capability key
//! (`/vehicles`, `/reports`, …). Fleetgate decides, per request, whether the
//! browser may see it:
//!
//! ```text
//! request ──→ edge filter ──→ access gate ──→ page
//!              (cookie?)       (session → grants → decide)
//! ```
//!
//! Anything that goes wrong while deciding ends in a login redirect, never
//! in access.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetgate::prelude::*;
//!
//! # async fn start(seed: &[u8]) -> Result<(), FleetgateError> {
//! let config = ServerConfig::load("fleet-portal.toml")?;
//! let store = MemoryStore::from_seed(config.session.clone(), seed)?;
//!
//! let server = FleetgateServer::builder()
//!     .config(config)
//!     .build(SharedStore::new(store))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::FleetgateError;
pub use server::{AppState, FleetgateServer, FleetgateServerBuilder, router};

/// Re-exports everything needed to run or embed a Fleetgate server.
pub mod prelude {
    pub use crate::{
        AppState, FleetgateError, FleetgateServer, FleetgateServerBuilder, ServerConfig, router,
    };

    pub use fleetgate_protocol::{
        AccessOutcome, AccessState, CapabilityKey, Grants, PermissionSet, Role, UserId,
        UserIdentity,
    };

    pub use fleetgate_session::{
        Authenticator, IdentityStore, MemoryStore, NewUser, SessionConfig, SharedStore,
        resolve_current_user,
    };

    pub use fleetgate_access::{
        AccessConfig, AccessGate, EdgeFilter, EdgeVerdict, KIOSK_SENTINEL, PermissionResolver,
        RequestContext,
    };
}
