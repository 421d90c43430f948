use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::conversation::ConversationRow;
use crate::models::message::MessageRow;

pub async fn create_conversation(
    pool: &PgPool,
    user_id: Uuid,
    title: Option<&str>,
) -> Result<ConversationRow> {
    Ok(sqlx::query_as::<_, ConversationRow>(
        r#"
        INSERT INTO conversations (id, user_id, title)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, title, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .fetch_one(pool)
    .await?)
}

pub async fn list_conversations(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationRow>> {
    Ok(sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, user_id, title, created_at
        FROM conversations
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Ownership check baked into the lookup: another user's conversation is
/// indistinguishable from a missing one.
pub async fn find_conversation(
    pool: &PgPool,
    user_id: Uuid,
    conversation_id: Uuid,
) -> Result<Option<ConversationRow>> {
    Ok(sqlx::query_as::<_, ConversationRow>(
        "SELECT id, user_id, title, created_at FROM conversations WHERE id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

pub async fn append_message(
    pool: &PgPool,
    conversation_id: Uuid,
    role: &str,
    content: &str,
) -> Result<MessageRow> {
    Ok(sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (id, conversation_id, role, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id, conversation_id, role, content, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .fetch_one(pool)
    .await?)
}

pub async fn list_messages(pool: &PgPool, conversation_id: Uuid) -> Result<Vec<MessageRow>> {
    Ok(sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, conversation_id, role, content, created_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?)
}
