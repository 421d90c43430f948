use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::AnalyticsSink;
use crate::auth::AuthClient;
use crate::config::Config;
use crate::memory::MemoryClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: AuthClient,
    pub memory: MemoryClient,
    /// Pluggable analytics sink. HTTP collector when configured, no-op otherwise.
    /// Failures at this seam are swallowed; product flows never depend on it.
    pub analytics: Arc<dyn AnalyticsSink>,
    pub config: Config,
}
