//! Benji Daemon - fitness and wellness assistant backend
//!
//! Orchestrates LLM calls over per-user fact bundles and serves the HTTP
//! API the frontend talks to.

use anyhow::Result;
use benjid::config::BenjiConfig;
use benjid::server::{self, AppState};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Benji Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = BenjiConfig::load()?;
    if config.api_key().is_none() {
        warn!(
            "No API key in ${}; LLM-backed endpoints will degrade or fail",
            config.llm.api_key_env
        );
    }

    let state = AppState::new(config)?;
    server::run(state).await
}
