//! `FleetgateServer` builder and server loop.
//!
//! This is the entry point for running the protected portal. It ties
//! together the layers: HTTP → edge filter → access gate → session store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use fleetgate_access::{AccessGate, EdgeFilter, RequestContext};
use fleetgate_session::SharedStore;
use tokio::net::TcpListener;

use crate::handler::routes;
use crate::{FleetgateError, ServerConfig};

/// Shared state passed to every request handler.
///
/// Cheap to clone: everything inside is behind an `Arc` or is itself a
/// shared handle.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: SharedStore,
    pub(crate) gate: Arc<AccessGate>,
    pub(crate) edge: Arc<EdgeFilter>,
    pub(crate) config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds handler state over a store and config.
    pub fn new(store: SharedStore, config: ServerConfig) -> Self {
        Self {
            store,
            gate: Arc::new(AccessGate::new(config.access.clone())),
            edge: Arc::new(EdgeFilter::new(config.access.clone())),
            config: Arc::new(config),
        }
    }

    /// The store handlers read and write through.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Builds the gate's view of a request from its path and cookies,
    /// stamped with the current time.
    pub(crate) fn request_context(
        &self,
        path: &str,
        session_token: Option<String>,
        scope_cookie: Option<String>,
    ) -> RequestContext {
        RequestContext {
            path: path.to_string(),
            session_token,
            scope_cookie,
            now: Utc::now(),
        }
    }
}

/// Builds the full application router over the given state.
///
/// Exposed so tests (and embedding applications) can drive the router
/// without binding a socket.
pub fn router(state: AppState) -> Router {
    routes(state)
}

/// Builder for configuring and starting a Fleetgate server.
///
/// # Example
///
/// ```rust,ignore
/// use fleetgate::prelude::*;
///
/// let server = FleetgateServer::builder()
///     .bind("0.0.0.0:3000")
///     .build(store)
///     .await?;
/// server.run().await
/// ```
pub struct FleetgateServerBuilder {
    config: ServerConfig,
}

impl FleetgateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Validates the config and binds the listener.
    ///
    /// # Errors
    /// - [`FleetgateError::Access`]: invalid paths or cookie names
    /// - [`FleetgateError::Io`]: the address could not be bound
    pub async fn build(self, store: SharedStore) -> Result<FleetgateServer, FleetgateError> {
        self.config.validate()?;
        let listener = TcpListener::bind(&self.config.bind).await?;
        let sweep_interval = match self.config.sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(FleetgateServer {
            listener,
            state: AppState::new(store, self.config),
            sweep_interval,
        })
    }
}

impl Default for FleetgateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Fleetgate server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct FleetgateServer {
    listener: TcpListener,
    state: AppState,
    sweep_interval: Option<Duration>,
}

impl FleetgateServer {
    /// Creates a new builder.
    pub fn builder() -> FleetgateServerBuilder {
        FleetgateServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    ///
    /// Also starts the expired-session sweeper, if enabled.
    pub async fn run(self) -> Result<(), FleetgateError> {
        if let Some(every) = self.sweep_interval {
            tokio::spawn(sweep_expired(self.state.store.clone(), every));
        }

        tracing::info!(addr = ?self.listener.local_addr().ok(), "Fleetgate server running");
        axum::serve(self.listener, router(self.state)).await?;
        Ok(())
    }
}

/// Periodically deletes sessions that are no longer live.
///
/// Expired sessions are already invisible to lookups; this only reclaims
/// memory.
async fn sweep_expired(store: SharedStore, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let purged = store.write().await.purge_expired(Utc::now());
        if !purged.is_empty() {
            tracing::info!(count = purged.len(), "swept expired sessions");
        }
    }
}
