//! Fleet portal: the Fleetgate server over a JSON seed of users.
//!
//! ```text
//! fleet-portal [config.toml] [seed.json]
//! ```
//!
//! Both paths default to the files shipped next to this crate. Set
//! `RUST_LOG=fleetgate=debug` to see every access decision.

use fleetgate::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fleet-portal.toml");
const DEFAULT_SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/seed.json");

#[tokio::main]
async fn main() -> Result<(), FleetgateError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let seed_path = args.next().unwrap_or_else(|| DEFAULT_SEED.to_string());

    let config = ServerConfig::load(&config_path)?;
    let store = load_store(&config, &seed_path)?;
    tracing::info!(config = %config_path, seed = %seed_path, "configuration loaded");

    let server = FleetgateServer::builder()
        .config(config)
        .build(store)
        .await?;
    server.run().await
}

fn load_store(config: &ServerConfig, seed_path: &str) -> Result<SharedStore, FleetgateError> {
    let seed = std::fs::read(seed_path)?;
    let store = MemoryStore::from_seed(config.session.clone(), &seed)?;
    Ok(SharedStore::new(store))
}
