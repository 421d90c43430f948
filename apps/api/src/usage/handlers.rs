use axum::{extract::State, http::HeaderMap, Json};

use crate::auth::require_user;
use crate::errors::AppError;
use crate::state::AppState;
use crate::usage::snapshot::{compute_snapshot, UsageSnapshot};

/// GET /api/v1/usage/guard
///
/// The caller is authenticated before any accounting work begins; a store
/// fault anywhere in the aggregation surfaces as a 500 with no partial body.
pub async fn handle_usage_guard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageSnapshot>, AppError> {
    let user = require_user(&state.auth, &headers).await?;
    let snapshot = compute_snapshot(&state.db, user.id, &state.config.usage).await?;
    Ok(Json(snapshot))
}
