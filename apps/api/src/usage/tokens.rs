use serde::{Deserialize, Serialize};

/// Discrete severity for a usage snapshot, derived from the worse of the
/// daily and monthly percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Ok,
    Warn,
    Critical,
    Blocked,
}

/// Approximate token cost of one message: ceil(chars / 4), minimum 1 for any
/// non-empty content. Missing/empty content costs 0. Estimation only;
/// exactness is explicitly not a goal.
pub fn approx_tokens(content: Option<&str>) -> i64 {
    let Some(text) = content else {
        return 0;
    };
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count() as i64;
    ((chars + 3) / 4).max(1)
}

/// Fraction of a budget consumed, clamped into [0,1].
pub fn usage_pct(used: i64, budget: i64) -> f64 {
    if budget <= 0 {
        return 1.0;
    }
    (used as f64 / budget as f64).clamp(0.0, 1.0)
}

/// Maps a usage percentage to a level. Thresholds are inclusive: exactly
/// hitting `warn_at` already warns, and a fully consumed budget blocks.
pub fn classify(pct: f64, warn_at: f64, critical_at: f64) -> UsageLevel {
    if pct >= 1.0 {
        UsageLevel::Blocked
    } else if pct >= critical_at {
        UsageLevel::Critical
    } else if pct >= warn_at {
        UsageLevel::Warn
    } else {
        UsageLevel::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_content_costs_zero() {
        assert_eq!(approx_tokens(None), 0);
        assert_eq!(approx_tokens(Some("")), 0);
    }

    #[test]
    fn test_four_chars_per_token() {
        assert_eq!(approx_tokens(Some("abcd")), 1);
        assert_eq!(approx_tokens(Some("abcdefgh")), 2);
    }

    #[test]
    fn test_minimum_one_token_for_nonempty() {
        assert_eq!(approx_tokens(Some("a")), 1);
        assert_eq!(approx_tokens(Some("abc")), 1);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(0.79, 0.8, 0.95), UsageLevel::Ok);
        assert_eq!(classify(0.80, 0.8, 0.95), UsageLevel::Warn);
        assert_eq!(classify(0.95, 0.8, 0.95), UsageLevel::Critical);
        assert_eq!(classify(1.0, 0.8, 0.95), UsageLevel::Blocked);
    }

    #[test]
    fn test_over_budget_is_blocked() {
        assert_eq!(classify(1.2, 0.8, 0.95), UsageLevel::Blocked);
    }

    #[test]
    fn test_usage_pct_clamped() {
        assert_eq!(usage_pct(0, 100), 0.0);
        assert_eq!(usage_pct(50, 100), 0.5);
        assert_eq!(usage_pct(150, 100), 1.0);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UsageLevel::Blocked).unwrap(),
            "\"blocked\""
        );
    }
}
