//! Mastery Engine - the per-attempt update pipeline
//!
//! Contains:
//! - Decay - time-based discount of stale estimates
//! - BKT - engagement-adjusted Bayesian Knowledge Tracing posterior
//! - Confidence - reliability score grown with each update
//! - Classifier - threshold labels over the final probability
//! - MasteryEngine - single-attempt and batch entry points

pub mod bkt;
pub mod classifier;
pub mod confidence;
pub mod decay;

mod batch;

pub use batch::MasteryEngine;
pub use classifier::classify;

/// Rounds half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
