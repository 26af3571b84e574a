//! Confidence model and attempt explanations
//!
//! c' = max(c, min(c + |p' - p| × gain × e, c_max))
//!
//! Growth stops at the cap. A stored confidence already above the cap is kept
//! as is rather than pulled down.

use crate::config::{BktParams, ConfidenceParams};

/// Grows confidence with the size of the probability move, scaled by the
/// clamped engagement.
pub fn update_confidence(
    confidence: f64,
    prior: f64,
    posterior: f64,
    engagement: f64,
    params: &ConfidenceParams,
) -> f64 {
    let delta = (posterior - prior).abs() * params.gain * engagement;
    (confidence + delta).min(params.max_confidence).max(confidence)
}

/// Human-readable trail entry for one attempt. Carries no state.
pub fn explain(
    correct: bool,
    prior: f64,
    posterior: f64,
    engagement: f64,
    params: &BktParams,
) -> String {
    let outcome = match (correct, engagement) {
        (true, e) if e < params.low_engagement_threshold => {
            "Correct with low engagement, possible guess"
        }
        (true, _) => "Correct answer",
        (false, e) if e > params.high_engagement_threshold => {
            "Incorrect with high engagement, genuine gap"
        }
        (false, _) => "Incorrect answer",
    };
    format!(
        "{outcome} (engagement {engagement:.2}): mastery {:.1}% -> {:.1}%",
        prior * 100.0,
        posterior * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_grows_with_move() {
        let params = ConfidenceParams::default();
        let c = update_confidence(0.1, 0.3, 0.6927, 1.0, &params);
        assert!((c - (0.1 + 0.3927 * 0.5)).abs() < 1e-9);
        let small = update_confidence(0.1, 0.3, 0.35, 1.0, &params);
        assert!(small < c);
    }

    #[test]
    fn test_confidence_scaled_by_engagement() {
        let params = ConfidenceParams::default();
        let low = update_confidence(0.1, 0.3, 0.6, 0.5, &params);
        let high = update_confidence(0.1, 0.3, 0.6, 1.5, &params);
        assert!(low < high);
    }

    #[test]
    fn test_confidence_capped() {
        let params = ConfidenceParams::default();
        assert_eq!(update_confidence(0.9, 0.0, 1.0, 1.5, &params), 0.95);
    }

    #[test]
    fn test_confidence_above_cap_never_lowered() {
        let params = ConfidenceParams::default();
        assert_eq!(update_confidence(0.98, 0.3, 0.6927, 1.0, &params), 0.98);
        assert_eq!(update_confidence(1.0, 0.8, 0.4, 1.5, &params), 1.0);
    }

    #[test]
    fn test_explanation_mentions_both_estimates() {
        let text = explain(true, 0.3, 0.6927, 1.0, &BktParams::default());
        assert_eq!(text, "Correct answer (engagement 1.00): mastery 30.0% -> 69.3%");

        let guessed = explain(true, 0.3, 0.584, 0.5, &BktParams::default());
        assert!(guessed.starts_with("Correct with low engagement"));

        let gap = explain(false, 0.3, 0.16, 1.4, &BktParams::default());
        assert!(gap.starts_with("Incorrect with high engagement"));
    }
}
