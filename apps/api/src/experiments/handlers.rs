use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analytics::{experiment_event_name, experiment_event_properties};
use crate::auth::{optional_user, require_user};
use crate::errors::AppError;
use crate::experiments::assignment::{assign_variant, CONTROL_VARIANT};
use crate::experiments::store;
use crate::models::experiment::ExperimentRow;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AssignResponse {
    pub experiment_id: String,
    pub variant: String,
}

#[derive(Deserialize)]
pub struct TrackEventRequest {
    pub event_name: String,
    #[serde(default)]
    pub properties: Option<Value>,
    /// Explicit variant for anonymous callers; authenticated callers may omit
    /// it and get their deterministic assignment.
    #[serde(default)]
    pub variant: Option<String>,
}

/// GET /api/v1/experiments
pub async fn handle_list_experiments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ExperimentRow>>, AppError> {
    require_user(&state.auth, &headers).await?;
    let experiments = store::load_running(&state.db).await?;
    Ok(Json(experiments))
}

/// POST /api/v1/experiments/:id/assign
pub async fn handle_assign(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AssignResponse>, AppError> {
    let user = require_user(&state.auth, &headers).await?;

    let experiment = store::find_running(&state.db, &experiment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Experiment {experiment_id} not found")))?;

    let variant = assign_variant(&user.id.to_string(), &experiment);
    store::record_assignment(&state.db, &experiment.id, user.id, &variant).await?;

    Ok(Json(AssignResponse {
        experiment_id: experiment.id,
        variant,
    }))
}

/// POST /api/v1/experiments/:id/events
///
/// Writes the durable event row first, then mirrors to the analytics sink.
/// The mirror can fail without affecting the response.
pub async fn handle_track_event(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<TrackEventRequest>,
) -> Result<Json<Value>, AppError> {
    if req.event_name.trim().is_empty() {
        return Err(AppError::Validation("event_name must not be empty".into()));
    }

    let experiment = store::find_running(&state.db, &experiment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Experiment {experiment_id} not found")))?;

    let user = optional_user(&state.auth, &headers).await;
    let variant = match (&req.variant, &user) {
        (Some(v), _) => v.clone(),
        (None, Some(u)) => assign_variant(&u.id.to_string(), &experiment),
        (None, None) => CONTROL_VARIANT.to_string(),
    };

    let properties = req.properties.unwrap_or_else(|| json!({}));
    store::record_event(
        &state.db,
        &experiment.id,
        user.as_ref().map(|u| u.id),
        &variant,
        &req.event_name,
        &properties,
    )
    .await?;

    let distinct_id = user
        .map(|u| u.id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    state
        .analytics
        .capture(
            &distinct_id,
            &experiment_event_name(&experiment.id, &req.event_name),
            experiment_event_properties(&variant, &properties),
        )
        .await;

    Ok(Json(json!({ "recorded": true, "variant": variant })))
}
