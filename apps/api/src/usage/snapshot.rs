use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::usage::budgets::BudgetConfig;
use crate::usage::tokens::{approx_tokens, classify, usage_pct, UsageLevel};

/// Monthly accounting is a trailing window, not a calendar month.
pub const WINDOW_DAYS: i64 = 30;
/// Worst-case bound on a subject's conversation rows considered.
pub const MAX_CONVERSATIONS: i64 = 5000;
/// The backing query interface limits identifiers per IN filter; above this
/// size chunking is a correctness requirement, not an optimization.
pub const CONVERSATION_CHUNK: usize = 200;
/// Per-chunk cap on message rows fetched.
pub const MAX_MESSAGES_PER_CHUNK: i64 = 10_000;

/// The on-demand usage view returned by the guard endpoint. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub level: UsageLevel,
    pub monthly_used_tokens: i64,
    pub monthly_budget_tokens: i64,
    pub monthly_usage_pct: f64,
    pub daily_used_tokens: i64,
    pub daily_budget_tokens: i64,
    pub daily_usage_pct: f64,
    pub next_reset_at: DateTime<Utc>,
    pub window_days: i64,
}

/// The two columns accounting needs from a message row.
#[derive(Debug, Clone, FromRow)]
pub struct MessageUsageRow {
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Folds message rows into (monthly, daily) token totals. The fetch window is
/// already bounded to the trailing 30 days, so every row counts toward the
/// monthly total; only rows at or after `day_start` count toward the daily
/// one. Daily is therefore always a subset of monthly.
pub fn accumulate(rows: &[MessageUsageRow], day_start: DateTime<Utc>) -> (i64, i64) {
    let mut monthly = 0i64;
    let mut daily = 0i64;
    for row in rows {
        let tokens = approx_tokens(row.content.as_deref());
        monthly += tokens;
        if row.created_at >= day_start {
            daily += tokens;
        }
    }
    (monthly, daily)
}

/// The next UTC midnight after `now`. Reported as the reset instant even
/// though the monthly sum is a rolling window; the mismatch is part of the
/// wire contract clients already consume.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    tomorrow
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now)
}

/// Current UTC day's midnight, the lower bound of the daily window.
pub fn utc_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now)
}

/// Builds a snapshot from precomputed totals.
pub fn snapshot_from_totals(
    monthly_used: i64,
    daily_used: i64,
    budgets: &BudgetConfig,
    now: DateTime<Utc>,
) -> UsageSnapshot {
    let monthly_usage_pct = usage_pct(monthly_used, budgets.monthly_tokens);
    let daily_usage_pct = usage_pct(daily_used, budgets.daily_tokens);
    // Exhausting either budget independently triggers the stricter level.
    let level = classify(
        monthly_usage_pct.max(daily_usage_pct),
        budgets.warn_at,
        budgets.critical_at,
    );

    UsageSnapshot {
        level,
        monthly_used_tokens: monthly_used,
        monthly_budget_tokens: budgets.monthly_tokens,
        monthly_usage_pct,
        daily_used_tokens: daily_used,
        daily_budget_tokens: budgets.daily_tokens,
        daily_usage_pct,
        next_reset_at: next_utc_midnight(now),
        window_days: WINDOW_DAYS,
    }
}

/// Recomputes the subject's usage snapshot from raw message rows.
///
/// Chunks are fetched strictly sequentially; any store error aborts the whole
/// computation and no partial snapshot is returned.
pub async fn compute_snapshot(
    pool: &PgPool,
    user_id: Uuid,
    budgets: &BudgetConfig,
) -> Result<UsageSnapshot> {
    let now = Utc::now();
    let window_start = now - Duration::days(WINDOW_DAYS);
    let day_start = utc_day_start(now);

    let conversation_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM conversations WHERE user_id = $1 ORDER BY created_at ASC LIMIT $2",
    )
    .bind(user_id)
    .bind(MAX_CONVERSATIONS)
    .fetch_all(pool)
    .await?;

    if conversation_ids.is_empty() {
        return Ok(snapshot_from_totals(0, 0, budgets, now));
    }

    let mut monthly_used = 0i64;
    let mut daily_used = 0i64;
    for chunk in conversation_ids.chunks(CONVERSATION_CHUNK) {
        let rows: Vec<MessageUsageRow> = sqlx::query_as(
            r#"
            SELECT content, created_at
            FROM messages
            WHERE conversation_id = ANY($1) AND created_at >= $2
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(chunk.to_vec())
        .bind(window_start)
        .bind(MAX_MESSAGES_PER_CHUNK)
        .fetch_all(pool)
        .await?;

        let (monthly, daily) = accumulate(&rows, day_start);
        monthly_used += monthly;
        daily_used += daily;
    }

    Ok(snapshot_from_totals(monthly_used, daily_used, budgets, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(content: &str, created_at: DateTime<Utc>) -> MessageUsageRow {
        MessageUsageRow {
            content: Some(content.to_string()),
            created_at,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_chunked_summation_equals_single_pass() {
        let day_start = at(2026, 8, 7, 0);
        let rows: Vec<MessageUsageRow> = (0..937usize)
            .map(|i| row(&"x".repeat(i % 50 + 1), at(2026, 8, 6, i as u32 % 24)))
            .collect();

        let (single_monthly, single_daily) = accumulate(&rows, day_start);
        let mut chunked_monthly = 0;
        let mut chunked_daily = 0;
        for chunk in rows.chunks(CONVERSATION_CHUNK) {
            let (m, d) = accumulate(chunk, day_start);
            chunked_monthly += m;
            chunked_daily += d;
        }

        assert_eq!(single_monthly, chunked_monthly);
        assert_eq!(single_daily, chunked_daily);
    }

    #[test]
    fn test_empty_rows_accumulate_to_zero() {
        let (monthly, daily) = accumulate(&[], at(2026, 8, 7, 0));
        assert_eq!(monthly, 0);
        assert_eq!(daily, 0);
    }

    #[test]
    fn test_daily_is_subset_of_monthly() {
        let day_start = at(2026, 8, 7, 0);
        let rows = vec![
            row("older message outside today", at(2026, 8, 1, 12)),
            row("today's message", at(2026, 8, 7, 9)),
        ];
        let (monthly, daily) = accumulate(&rows, day_start);
        assert!(daily <= monthly);
        assert_eq!(daily, approx_tokens(Some("today's message")));
    }

    #[test]
    fn test_midnight_boundary_counts_as_today() {
        let day_start = at(2026, 8, 7, 0);
        let rows = vec![row("abcd", day_start)];
        let (_, daily) = accumulate(&rows, day_start);
        assert_eq!(daily, 1);
    }

    #[test]
    fn test_next_utc_midnight() {
        let now = at(2026, 8, 7, 15);
        assert_eq!(next_utc_midnight(now), at(2026, 8, 8, 0));
    }

    #[test]
    fn test_zero_usage_snapshot_is_ok() {
        let snap = snapshot_from_totals(0, 0, &BudgetConfig::default(), at(2026, 8, 7, 15));
        assert_eq!(snap.level, UsageLevel::Ok);
        assert_eq!(snap.monthly_used_tokens, 0);
        assert_eq!(snap.monthly_usage_pct, 0.0);
        assert_eq!(snap.window_days, 30);
    }

    #[test]
    fn test_daily_exhaustion_alone_blocks() {
        let budgets = BudgetConfig::default();
        let snap = snapshot_from_totals(100, budgets.daily_tokens, &budgets, at(2026, 8, 7, 15));
        assert_eq!(snap.level, UsageLevel::Blocked);
        assert_eq!(snap.daily_usage_pct, 1.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snap = snapshot_from_totals(0, 0, &BudgetConfig::default(), at(2026, 8, 7, 15));
        let body = serde_json::to_value(&snap).unwrap();
        assert!(body.get("monthlyUsedTokens").is_some());
        assert!(body.get("nextResetAt").is_some());
        assert_eq!(body["windowDays"], 30);
        assert_eq!(body["level"], "ok");
    }
}
