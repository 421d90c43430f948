pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat_handlers;
use crate::experiments::handlers as experiment_handlers;
use crate::memory;
use crate::state::AppState;
use crate::usage::handlers as usage_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversations
        .route(
            "/api/v1/conversations",
            post(chat_handlers::handle_create_conversation)
                .get(chat_handlers::handle_list_conversations),
        )
        .route(
            "/api/v1/conversations/:id/messages",
            post(chat_handlers::handle_append_message).get(chat_handlers::handle_list_messages),
        )
        // Experiments
        .route(
            "/api/v1/experiments",
            get(experiment_handlers::handle_list_experiments),
        )
        .route(
            "/api/v1/experiments/:id/assign",
            post(experiment_handlers::handle_assign),
        )
        .route(
            "/api/v1/experiments/:id/events",
            post(experiment_handlers::handle_track_event),
        )
        // Usage guard
        .route("/api/v1/usage/guard", get(usage_handlers::handle_usage_guard))
        // Memory proxy
        .route("/api/v1/memory", post(memory::handle_memory_add))
        .route("/api/v1/memory/search", post(memory::handle_memory_search))
        .with_state(state)
}
