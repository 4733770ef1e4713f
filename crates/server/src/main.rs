//! HTTP surface for Troupe rooms.
//!
//! Serves the JSON API, the per-room live event stream, and optionally the
//! built frontend.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use broadcaster::LiveBroadcaster;
use database::{settings, Database, Settings};
use openai_completion::OpenAiCompletion;
use orchestrator::{Orchestrator, OrchestratorConfig};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::{AppState, SettingsSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Troupe server");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let client = Arc::new(OpenAiCompletion::from_env()?);
    sync_settings(&db, &client).await?;

    let broadcaster = LiveBroadcaster::new();
    let orchestrator = Orchestrator::new(
        db.clone(),
        client.clone(),
        broadcaster.clone(),
        OrchestratorConfig::from_env(),
    );
    let state = AppState::new(orchestrator, client);

    let mut app = routes::router();
    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "Serving frontend");
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app.with_state(state);

    info!(addr = %config.addr, "Troupe server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(broadcaster))
        .await?;

    db.close().await;
    Ok(())
}

/// Reconcile the stored settings row with the environment.
///
/// A stored key wins. If none is stored yet, the environment's endpoint,
/// key and model are saved so the settings page shows what is in use.
async fn sync_settings(db: &Database, client: &OpenAiCompletion) -> database::Result<()> {
    let stored = settings::get_settings(db.pool()).await?;
    if !stored.api_key.is_empty() {
        client.apply(&stored);
        return Ok(());
    }

    let env = client.config();
    if env.api_key.is_empty() {
        warn!("No completion API key configured; set LLM_API_KEY or use the settings API");
        client.apply(&stored);
        return Ok(());
    }

    let seeded = settings::update_settings(
        db.pool(),
        &Settings {
            api_endpoint: env.api_endpoint,
            api_key: env.api_key,
            default_model: env.default_model,
        },
    )
    .await?;
    info!(endpoint = %seeded.api_endpoint, "Seeded settings from environment");
    Ok(())
}

/// Resolve on Ctrl+C and close every live event stream.
async fn shutdown_signal(broadcaster: LiveBroadcaster) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    broadcaster.shutdown();
}
