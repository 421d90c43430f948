use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An experiment definition as stored in the external configuration store.
/// Read-only to this service; lifecycle is draft → running → paused/concluded
/// and the bulk loader only surfaces `running` rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperimentRow {
    pub id: String,
    pub name: String,
    /// Ordered, non-empty for well-formed experiments. An empty list is
    /// tolerated by the assignment engine (falls back to control).
    pub variants: Vec<String>,
    /// Share of the population enrolled, integer percent in [1,100].
    pub traffic_pct: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
