//! Time decay of mastery estimates
//!
//! p' = max(p × (1 - rate)^days, floor)
//!
//! Elapsed time is counted in whole days; zero or negative elapsed time leaves
//! the decay factor at 1. The floor applies regardless of elapsed time.

use chrono::{DateTime, Utc};

use crate::config::DecayParams;
use crate::engine::round_to;
use crate::error::{ensure_unit, MasteryError, Result};

/// Whole days between `last_observed` and `now`, never negative.
pub fn elapsed_days(last_observed: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_observed).num_days().max(0)
}

pub fn decay(probability: f64, elapsed_days: i64, params: &DecayParams) -> Result<f64> {
    let probability = ensure_unit("probability", probability)?;
    if !(0.0..1.0).contains(&params.rate) {
        return Err(MasteryError::InvalidConfig(format!(
            "decay.rate must be in [0, 1): {}",
            params.rate
        )));
    }

    let factor = if elapsed_days <= 0 {
        1.0
    } else {
        (1.0 - params.rate).powf(elapsed_days as f64)
    };
    Ok(round_to(apply_floor(probability * factor, params), 4))
}

/// Zero-elapsed decay on an unrounded value: only the floor applies.
pub fn apply_floor(probability: f64, params: &DecayParams) -> f64 {
    probability.max(params.floor)
}

/// Decays a stored probability from its observation time to `now`.
pub fn decay_since(
    probability: f64,
    last_observed: DateTime<Utc>,
    now: DateTime<Utc>,
    params: &DecayParams,
) -> Result<f64> {
    decay(probability, elapsed_days(last_observed, now), params)
}
