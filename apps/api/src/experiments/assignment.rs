use crate::models::experiment::ExperimentRow;

/// Sentinel variant for subjects outside the enrolled population (and for
/// degenerate experiment definitions).
pub const CONTROL_VARIANT: &str = "control";

const HASH_SEED: u32 = 5381;
const UNIT_RANGE: f64 = 4_294_967_296.0; // 2^32

/// Stable 32-bit hash of `"{subject_id}:{experiment_id}"`.
///
/// Rolling multiply-xor over the UTF-16 code units of the key: seed 5381,
/// per unit `hash = ((hash * 33) ^ unit) mod 2^32`, the multiply expressed as
/// shift-and-add. COMPATIBILITY: previously persisted assignments depend on
/// this exact arithmetic; changing it reshuffles every bucket.
pub fn bucket_hash(subject_id: &str, experiment_id: &str) -> u32 {
    let key = format!("{subject_id}:{experiment_id}");
    let mut hash: u32 = HASH_SEED;
    for unit in key.encode_utf16() {
        hash = ((hash << 5).wrapping_add(hash)) ^ u32::from(unit);
    }
    hash
}

/// Deterministically assigns a subject to one of an experiment's variants.
///
/// The hash is normalized into [0,1); subjects landing at or above
/// `traffic_pct` are outside the experiment and get `"control"`. Enrolled
/// subjects are re-normalized across the enrolled sub-range so variants stay
/// uniform regardless of the traffic percentage. Pure function of the two
/// identifiers: no I/O, no clock, no randomness.
pub fn assign_variant(subject_id: &str, experiment: &ExperimentRow) -> String {
    let unit = f64::from(bucket_hash(subject_id, &experiment.id)) / UNIT_RANGE;
    let scaled = unit * 100.0;

    if scaled >= f64::from(experiment.traffic_pct) {
        return CONTROL_VARIANT.to_string();
    }

    let relative = scaled / f64::from(experiment.traffic_pct);
    let index = (relative * experiment.variants.len() as f64).floor() as usize;

    experiment
        .variants
        .get(index)
        .cloned()
        .unwrap_or_else(|| CONTROL_VARIANT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn experiment(id: &str, variants: &[&str], traffic_pct: i32) -> ExperimentRow {
        ExperimentRow {
            id: id.to_string(),
            name: id.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            traffic_pct,
            status: "running".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bucket_hash_known_value() {
        // Hand-computed: 5381*33 ^ ':' = 177567, then fold in 'a' etc.
        assert_eq!(bucket_hash("", ""), 177_567);
        assert_eq!(bucket_hash("a", ""), 5_860_990);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let exp = experiment("onboarding-cta", &["A", "B", "C"], 100);
        for i in 0..200 {
            let subject = format!("user-{i}");
            assert_eq!(
                assign_variant(&subject, &exp),
                assign_variant(&subject, &exp)
            );
        }
    }

    #[test]
    fn test_empty_variant_list_falls_back_to_control() {
        let exp = experiment("x", &[], 100);
        assert_eq!(assign_variant("some-user", &exp), CONTROL_VARIANT);
    }

    #[test]
    fn test_traffic_gating_converges() {
        // Half the population should land outside a 50% experiment.
        let exp = experiment("gated", &["A", "B"], 50);
        let control = (0..10_000)
            .filter(|i| assign_variant(&format!("subject-{i}"), &exp) == CONTROL_VARIANT)
            .count() as f64
            / 10_000.0;
        assert!(
            (0.40..=0.60).contains(&control),
            "control share was {control}"
        );
    }

    #[test]
    fn test_fully_enrolled_has_no_gated_control() {
        let exp = experiment("full", &["A", "B"], 100);
        let control = (0..10_000)
            .filter(|i| assign_variant(&format!("subject-{i}"), &exp) == CONTROL_VARIANT)
            .count();
        assert_eq!(control, 0);
    }

    #[test]
    fn test_variant_coverage_roughly_uniform() {
        let exp = experiment("split", &["A", "B"], 100);
        let a = (0..10_000)
            .filter(|i| assign_variant(&format!("subject-{i}"), &exp) == "A")
            .count() as f64
            / 10_000.0;
        assert!((0.40..=0.60).contains(&a), "variant A share was {a}");
    }

    #[test]
    fn test_enrolled_subjects_cover_all_variants() {
        // Re-normalization must spread a low-traffic experiment's enrollees
        // across every variant, not just the first.
        let exp = experiment("narrow", &["A", "B"], 10);
        let mut seen_a = false;
        let mut seen_b = false;
        for i in 0..10_000 {
            match assign_variant(&format!("subject-{i}"), &exp).as_str() {
                "A" => seen_a = true,
                "B" => seen_b = true,
                _ => {}
            }
        }
        assert!(seen_a && seen_b);
    }
}
