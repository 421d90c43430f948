/// Token budget configuration for the usage guard.
///
/// Sourced from `USAGE_GUARD_*` environment variables; every value is
/// optional and any non-finite, non-positive, or unparseable input silently
/// falls back to the documented default (config faults are corrected, never
/// surfaced — taxonomy class d).
use serde::{Deserialize, Serialize};

pub const DEFAULT_MONTHLY_TOKENS: i64 = 1_500_000;
pub const DEFAULT_WARN_AT: f64 = 0.80;
pub const DEFAULT_CRITICAL_AT: f64 = 0.95;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub monthly_tokens: i64,
    pub daily_tokens: i64,
    /// Warn threshold fraction, always within [0,1].
    pub warn_at: f64,
    /// Critical threshold fraction, always within [0,1].
    pub critical_at: f64,
}

impl BudgetConfig {
    pub fn from_env() -> Self {
        Self::resolve(
            env_f64("USAGE_GUARD_MONTHLY_TOKEN_BUDGET"),
            env_f64("USAGE_GUARD_DAILY_TOKEN_BUDGET"),
            env_f64("USAGE_GUARD_WARN_AT"),
            env_f64("USAGE_GUARD_CRITICAL_AT"),
        )
    }

    /// Applies the numeric policy: budget fallbacks, daily = monthly/30
    /// floored when unset, threshold clamping into [0,1].
    pub fn resolve(
        monthly: Option<f64>,
        daily: Option<f64>,
        warn_at: Option<f64>,
        critical_at: Option<f64>,
    ) -> Self {
        let monthly_tokens = sane_budget(monthly).unwrap_or(DEFAULT_MONTHLY_TOKENS);
        let daily_tokens = sane_budget(daily).unwrap_or(monthly_tokens / 30);
        let warn_at = sane_fraction(warn_at, DEFAULT_WARN_AT);
        let critical_at = sane_fraction(critical_at, DEFAULT_CRITICAL_AT);

        Self {
            monthly_tokens,
            daily_tokens,
            warn_at,
            critical_at,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self::resolve(None, None, None, None)
    }
}

fn sane_budget(value: Option<f64>) -> Option<i64> {
    value
        .filter(|v| v.is_finite() && *v >= 1.0)
        .map(|v| v.floor() as i64)
}

fn sane_fraction(value: Option<f64>, fallback: f64) -> f64 {
    value
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
        .clamp(0.0, 1.0)
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = BudgetConfig::resolve(None, None, None, None);
        assert_eq!(cfg.monthly_tokens, 1_500_000);
        assert_eq!(cfg.daily_tokens, 50_000);
        assert_eq!(cfg.warn_at, 0.80);
        assert_eq!(cfg.critical_at, 0.95);
    }

    #[test]
    fn test_daily_follows_configured_monthly() {
        let cfg = BudgetConfig::resolve(Some(3_000_000.0), None, None, None);
        assert_eq!(cfg.monthly_tokens, 3_000_000);
        assert_eq!(cfg.daily_tokens, 100_000);
    }

    #[test]
    fn test_daily_floor_division() {
        let cfg = BudgetConfig::resolve(Some(100.0), None, None, None);
        assert_eq!(cfg.daily_tokens, 3);
    }

    #[test]
    fn test_non_finite_budget_falls_back() {
        let cfg = BudgetConfig::resolve(Some(f64::NAN), Some(f64::INFINITY), None, None);
        assert_eq!(cfg.monthly_tokens, 1_500_000);
        assert_eq!(cfg.daily_tokens, 50_000);
    }

    #[test]
    fn test_non_positive_budget_falls_back() {
        let cfg = BudgetConfig::resolve(Some(-5.0), Some(0.0), None, None);
        assert_eq!(cfg.monthly_tokens, 1_500_000);
        assert_eq!(cfg.daily_tokens, 50_000);
    }

    #[test]
    fn test_thresholds_clamped() {
        let cfg = BudgetConfig::resolve(None, None, Some(1.7), Some(-0.2));
        assert_eq!(cfg.warn_at, 1.0);
        assert_eq!(cfg.critical_at, 0.0);
    }

    #[test]
    fn test_non_finite_threshold_falls_back() {
        let cfg = BudgetConfig::resolve(None, None, Some(f64::NAN), None);
        assert_eq!(cfg.warn_at, 0.80);
    }
}
