/// Memory service proxy — the single point of entry for the third-party
/// memory API.
///
/// Pure pass-through: request bodies are forwarded with the authenticated
/// user attached server-side, responses come back as raw JSON. No retries;
/// an upstream non-2xx surfaces as a generic server error.
use axum::{extract::State, http::HeaderMap, Json};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::require_user;
use crate::errors::AppError;
use crate::state::AppState;

const MEMORY_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct MemoryClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MemoryClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(MEMORY_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// POST /v1/memories — stores conversation turns against the user.
    pub async fn add(&self, user_id: &str, messages: &Value) -> Result<Value, AppError> {
        self.forward(
            "/v1/memories",
            &json!({ "user_id": user_id, "messages": messages }),
        )
        .await
    }

    /// POST /v1/memories/search — retrieves memories relevant to a query.
    pub async fn search(&self, user_id: &str, query: &str) -> Result<Value, AppError> {
        self.forward(
            "/v1/memories/search",
            &json!({ "user_id": user_id, "query": query }),
        )
        .await
    }

    async fn forward(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("memory service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "memory service returned {status}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("memory service response invalid: {e}")))
    }
}

#[derive(Deserialize)]
pub struct MemoryAddRequest {
    pub messages: Value,
}

#[derive(Deserialize)]
pub struct MemorySearchRequest {
    pub query: String,
}

/// POST /api/v1/memory
pub async fn handle_memory_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MemoryAddRequest>,
) -> Result<Json<Value>, AppError> {
    let user = require_user(&state.auth, &headers).await?;
    // The upstream subject is always the authenticated caller, never
    // client-supplied.
    let response = state
        .memory
        .add(&user.id.to_string(), &req.messages)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/memory/search
pub async fn handle_memory_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MemorySearchRequest>,
) -> Result<Json<Value>, AppError> {
    let user = require_user(&state.auth, &headers).await?;
    let response = state
        .memory
        .search(&user.id.to_string(), &req.query)
        .await?;
    Ok(Json(response))
}
