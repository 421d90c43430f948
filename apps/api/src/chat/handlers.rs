use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::require_user;
use crate::chat::store;
use crate::errors::AppError;
use crate::models::conversation::ConversationRow;
use crate::models::message::MessageRow;
use crate::state::AppState;

const VALID_ROLES: &[&str] = &["user", "assistant"];

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct AppendMessageRequest {
    pub role: String,
    pub content: String,
}

/// POST /api/v1/conversations
pub async fn handle_create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateConversationRequest>,
) -> Result<Json<ConversationRow>, AppError> {
    let user = require_user(&state.auth, &headers).await?;
    let conversation = store::create_conversation(&state.db, user.id, req.title.as_deref()).await?;
    Ok(Json(conversation))
}

/// GET /api/v1/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationRow>>, AppError> {
    let user = require_user(&state.auth, &headers).await?;
    let conversations = store::list_conversations(&state.db, user.id).await?;
    Ok(Json(conversations))
}

/// POST /api/v1/conversations/:id/messages
pub async fn handle_append_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<AppendMessageRequest>,
) -> Result<Json<MessageRow>, AppError> {
    let user = require_user(&state.auth, &headers).await?;

    if !VALID_ROLES.contains(&req.role.as_str()) {
        return Err(AppError::Validation(format!(
            "role must be one of: {}",
            VALID_ROLES.join(", ")
        )));
    }

    store::find_conversation(&state.db, user.id, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;

    let message =
        store::append_message(&state.db, conversation_id, &req.role, &req.content).await?;
    Ok(Json(message))
}

/// GET /api/v1/conversations/:id/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    let user = require_user(&state.auth, &headers).await?;

    store::find_conversation(&state.db, user.id, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;

    let messages = store::list_messages(&state.db, conversation_id).await?;
    Ok(Json(messages))
}
