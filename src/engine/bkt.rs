//! BKT (Bayesian Knowledge Tracing) - engagement-adjusted posterior update
//!
//! Two hidden states, known / not known, observed through noisy answers:
//! - correct:   P(L|obs) = P(L)(1-S) / (P(L)(1-S) + (1-P(L))G')
//! - incorrect: P(L|obs) = P(L)S' / (P(L)S' + (1-P(L))(1-G))
//! - transition: P(L') = P(L|obs) + (1-P(L|obs)) × min(T_max, T × e)
//!
//! Engagement e is clamped to the configured range first. Low engagement
//! inflates the guess rate G' on correct answers; high engagement shrinks the
//! slip rate S' on incorrect answers.

use crate::config::BktParams;
use crate::engine::round_to;
use crate::error::{ensure_engagement, ensure_unit, Result};

/// Validates and clamps an engagement multiplier.
pub fn clamp_engagement(engagement: f64, params: &BktParams) -> Result<f64> {
    let engagement = ensure_engagement(engagement)?;
    Ok(engagement.clamp(params.min_engagement, params.max_engagement))
}

/// Guess rate used for a correct answer at the given (clamped) engagement.
pub fn effective_guess(engagement: f64, params: &BktParams) -> f64 {
    if engagement < params.low_engagement_threshold {
        (params.p_guess * params.guess_inflation).min(params.max_guess)
    } else {
        params.p_guess
    }
}

/// Slip rate used for an incorrect answer at the given (clamped) engagement.
pub fn effective_slip(engagement: f64, params: &BktParams) -> f64 {
    if engagement > params.high_engagement_threshold {
        (params.p_slip * params.slip_reduction).max(params.min_slip)
    } else {
        params.p_slip
    }
}

/// Learning-transition probability for the given (clamped) engagement.
pub fn transit_rate(engagement: f64, params: &BktParams) -> f64 {
    (params.p_transit * engagement).min(params.max_transit)
}

/// Bayes step over the observation only, before the learning transition.
fn observe(prior: f64, correct: bool, engagement: f64, params: &BktParams) -> f64 {
    let (num, den) = if correct {
        let num = prior * (1.0 - params.p_slip);
        (num, num + (1.0 - prior) * effective_guess(engagement, params))
    } else {
        let num = prior * effective_slip(engagement, params);
        (num, num + (1.0 - prior) * (1.0 - params.p_guess))
    };
    num / den
}

/// Unrounded posterior; batch chains carry this value between attempts.
pub fn update_raw(prior: f64, correct: bool, engagement: f64, params: &BktParams) -> Result<f64> {
    let prior = ensure_unit("prior", prior)?;
    let engagement = clamp_engagement(engagement, params)?;

    let posterior = observe(prior, correct, engagement, params);
    let learned = posterior + (1.0 - posterior) * transit_rate(engagement, params);
    Ok(learned.clamp(0.0, 1.0))
}

/// Posterior rounded to 4 decimals.
pub fn update(prior: f64, correct: bool, engagement: f64, params: &BktParams) -> Result<f64> {
    update_raw(prior, correct, engagement, params).map(|p| round_to(p, 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MasteryError;

    fn params() -> BktParams {
        BktParams::default()
    }

    #[test]
    fn test_cold_start_correct_answer() {
        // 0.27 / (0.27 + 0.14) = 0.6585, then + 0.3415 * 0.1
        assert_eq!(update(0.3, true, 1.0, &params()).unwrap(), 0.6927);
    }

    #[test]
    fn test_engagement_orders_correct_answers() {
        let low = update(0.3, true, 0.5, &params()).unwrap();
        let mid = update(0.3, true, 1.0, &params()).unwrap();
        let high = update(0.3, true, 1.5, &params()).unwrap();
        assert_eq!(low, 0.5844);
        assert_eq!(high, 0.7098);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_incorrect_answer_lowers_estimate() {
        assert_eq!(update(0.3, false, 1.0, &params()).unwrap(), 0.1458);
        assert_eq!(update(0.8, false, 1.0, &params()).unwrap(), 0.4);
    }

    #[test]
    fn test_high_engagement_failure_trusts_the_miss() {
        assert_eq!(effective_slip(1.4, &params()), 0.05);
        assert_eq!(effective_slip(1.2, &params()), 0.1);
        assert_eq!(update(0.3, false, 1.4, &params()).unwrap(), 0.1624);
    }

    #[test]
    fn test_low_engagement_inflates_guess() {
        assert!((effective_guess(0.6, &params()) - 0.3).abs() < 1e-12);
        assert_eq!(effective_guess(0.8, &params()), 0.2);

        let mut p = params();
        p.p_guess = 0.4;
        assert_eq!(effective_guess(0.5, &p), 0.5);
    }

    #[test]
    fn test_engagement_clamped_not_rejected() {
        assert_eq!(
            update(0.3, true, 4.0, &params()).unwrap(),
            update(0.3, true, 1.5, &params()).unwrap()
        );
        assert_eq!(
            update(0.3, true, 0.0, &params()).unwrap(),
            update(0.3, true, 0.5, &params()).unwrap()
        );
    }

    #[test]
    fn test_transition_is_capped() {
        let mut p = params();
        p.p_transit = 0.5;
        assert_eq!(transit_rate(1.5, &p), 0.3);
    }

    #[test]
    fn test_extreme_priors_stay_finite() {
        let zero = update_raw(0.0, true, 1.0, &params()).unwrap();
        assert!((zero - 0.1).abs() < 1e-12);
        assert_eq!(update_raw(1.0, false, 1.0, &params()).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(
            update(1.1, true, 1.0, &params()),
            Err(MasteryError::InvalidProbability { field: "prior", .. })
        ));
        assert!(matches!(
            update(0.5, true, -0.2, &params()),
            Err(MasteryError::InvalidEngagement(_))
        ));
        assert!(update(f64::NAN, false, 1.0, &params()).is_err());
    }
}
