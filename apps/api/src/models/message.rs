use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    /// "user" or "assistant".
    pub role: String,
    /// Nullable: a message with no content costs zero tokens in accounting.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}
