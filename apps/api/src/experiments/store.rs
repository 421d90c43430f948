use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::experiment::ExperimentRow;

/// Bulk loader: every experiment currently accepting traffic.
pub async fn load_running(pool: &PgPool) -> Result<Vec<ExperimentRow>> {
    Ok(sqlx::query_as::<_, ExperimentRow>(
        r#"
        SELECT id, name, variants, traffic_pct, status, created_at
        FROM experiments
        WHERE status = 'running'
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?)
}

/// Looks up a single experiment, only if it is running.
pub async fn find_running(pool: &PgPool, experiment_id: &str) -> Result<Option<ExperimentRow>> {
    Ok(sqlx::query_as::<_, ExperimentRow>(
        r#"
        SELECT id, name, variants, traffic_pct, status, created_at
        FROM experiments
        WHERE id = $1 AND status = 'running'
        "#,
    )
    .bind(experiment_id)
    .fetch_optional(pool)
    .await?)
}

/// Persists an assignment. The mapping is a pure function of the pair, so the
/// stored row is a cache, not a source of truth: concurrent first-assignment
/// calls race to insert the same values and the loser is dropped silently.
pub async fn record_assignment(
    pool: &PgPool,
    experiment_id: &str,
    user_id: Uuid,
    variant: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO experiment_assignments (experiment_id, user_id, variant)
        VALUES ($1, $2, $3)
        ON CONFLICT (experiment_id, user_id) DO NOTHING
        "#,
    )
    .bind(experiment_id)
    .bind(user_id)
    .bind(variant)
    .execute(pool)
    .await?;

    info!("Recorded assignment {experiment_id}/{user_id} -> {variant}");
    Ok(())
}

/// Durable funnel-event row. `user_id` is nullable: anonymous funnel traffic
/// is recorded too.
pub async fn record_event(
    pool: &PgPool,
    experiment_id: &str,
    user_id: Option<Uuid>,
    variant: &str,
    event_name: &str,
    properties: &Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO experiment_events (experiment_id, user_id, variant, event_name, properties)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(experiment_id)
    .bind(user_id)
    .bind(variant)
    .bind(event_name)
    .bind(properties)
    .execute(pool)
    .await?;

    Ok(())
}
