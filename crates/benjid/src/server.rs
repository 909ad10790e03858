//! HTTP server for benjid

use crate::config::BenjiConfig;
use crate::gateway::{GeminiClient, LlmGateway};
use crate::routes;
use crate::store::FactStore;
use anyhow::{Context, Result};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers. The fact store serializes its
/// own writes; the gateway client is stateless per request.
pub struct AppState {
    pub config: BenjiConfig,
    pub store: FactStore,
    pub gateway: Arc<dyn LlmGateway>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: BenjiConfig) -> Result<Self> {
        let store = FactStore::open(Path::new(&config.store.db_path))?;
        let gateway: Arc<dyn LlmGateway> = Arc::new(GeminiClient::new(&config));
        Ok(Self { config, store, gateway, start_time: Instant::now() })
    }

    /// State with a caller-supplied gateway and in-memory store, for tests.
    pub fn for_tests(config: BenjiConfig, gateway: Arc<dyn LlmGateway>) -> Result<Self> {
        let store = FactStore::open_in_memory()?;
        Ok(Self { config, store, gateway, start_time: Instant::now() })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::chat_routes())
        .merge(routes::profile_routes())
        .merge(routes::goal_routes())
        .merge(routes::plan_routes())
        .merge(routes::checkin_routes())
        .merge(routes::medication_routes())
        .merge(routes::cycle_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // The static frontend is served from a different origin.
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
