mod analytics;
mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod experiments;
mod memory;
mod models;
mod routes;
mod state;
mod usage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::{AnalyticsSink, HttpAnalyticsSink, NoopAnalyticsSink};
use crate::auth::AuthClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::memory::MemoryClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("quill_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quill API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize auth client
    let auth = AuthClient::new(config.auth_api_url.clone(), config.auth_api_key.clone());
    info!("Auth client initialized");

    // Initialize memory service client
    let memory = MemoryClient::new(config.memory_api_url.clone(), config.memory_api_key.clone());
    info!("Memory client initialized");

    // Initialize analytics sink (no-op unless a collector is configured)
    let analytics: Arc<dyn AnalyticsSink> =
        match (&config.analytics_api_url, &config.analytics_api_key) {
            (Some(url), Some(key)) => {
                info!("Analytics collector configured: {url}");
                Arc::new(HttpAnalyticsSink::new(url.clone(), key.clone()))
            }
            _ => {
                info!("Analytics collector not configured, events will be dropped");
                Arc::new(NoopAnalyticsSink)
            }
        };

    info!(
        "Usage guard budgets: {} tokens/month, {} tokens/day",
        config.usage.monthly_tokens, config.usage.daily_tokens
    );

    // Build app state
    let state = AppState {
        db,
        auth,
        memory,
        analytics,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
