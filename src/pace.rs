//! Learning pace - mastery velocity over recorded snapshots
//!
//! velocity = (last score - first score) / max(elapsed days, 0.1)
//!
//! Scores are on the 0-100 scale. Snapshots are supplied by the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::round_to;

pub const DEFAULT_WINDOW_DAYS: i64 = 14;

const MIN_ELAPSED_DAYS: f64 = 0.1;
const FAST_ABOVE: f64 = 1.5;
const STEADY_FROM: f64 = 0.2;
const PLATEAU_ABOVE: f64 = -0.5;
const LOW_MASTERY_BELOW: f64 = 40.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterySnapshot {
    /// Concept, module or subject id the score belongs to
    pub level_id: String,
    pub mastery_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaceCategory {
    #[serde(rename = "Fast Progressing")]
    FastProgressing,
    #[serde(rename = "Steady Progressing")]
    SteadyProgressing,
    Plateaued,
    Struggling,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityResult {
    /// Score points per day; `None` with fewer than two snapshots
    pub velocity: Option<f64>,
    pub trend: PaceTrend,
    pub category: PaceCategory,
    pub explanation: String,
}

impl VelocityResult {
    fn insufficient() -> Self {
        Self {
            velocity: None,
            trend: PaceTrend::InsufficientData,
            category: PaceCategory::Unknown,
            explanation: "Not enough data points to calculate velocity.".to_string(),
        }
    }
}

pub fn categorize(velocity: f64) -> PaceCategory {
    if velocity > FAST_ABOVE {
        PaceCategory::FastProgressing
    } else if velocity >= STEADY_FROM {
        PaceCategory::SteadyProgressing
    } else if velocity > PLATEAU_ABOVE {
        PaceCategory::Plateaued
    } else {
        PaceCategory::Struggling
    }
}

/// Velocity over snapshots taken within `window_days` before `now`.
///
/// A negative window selects nothing. A window reaching past the earliest
/// representable instant has no lower bound.
pub fn compute_velocity(
    snapshots: &[MasterySnapshot],
    window_days: i64,
    now: DateTime<Utc>,
) -> VelocityResult {
    if window_days < 0 {
        return VelocityResult::insufficient();
    }
    let start = window_start(now, window_days);
    let mut in_window: Vec<&MasterySnapshot> = snapshots
        .iter()
        .filter(|s| start.map_or(true, |start| s.timestamp >= start) && s.timestamp <= now)
        .collect();

    if in_window.len() < 2 {
        return VelocityResult::insufficient();
    }
    in_window.sort_by_key(|s| s.timestamp);

    let (first, last) = (in_window[0], in_window[in_window.len() - 1]);
    let elapsed_days = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 86_400_000.0;
    let elapsed_days = elapsed_days.max(MIN_ELAPSED_DAYS);

    let delta = last.mastery_score - first.mastery_score;
    let velocity = delta / elapsed_days;

    let trend = if velocity > 0.0 {
        PaceTrend::Improving
    } else if velocity < 0.0 {
        PaceTrend::Declining
    } else {
        PaceTrend::Stable
    };

    VelocityResult {
        velocity: Some(round_to(velocity, 2)),
        trend,
        category: categorize(velocity),
        explanation: format!("Mastery changed by {delta:.1} over {elapsed_days:.1} days."),
    }
}

fn window_start(now: DateTime<Utc>, window_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(window_days).and_then(|window| now.checked_sub_signed(window))
}

/// Student ids grouped by pace category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaceOverview {
    pub fast_progressing: Vec<String>,
    pub steady: Vec<String>,
    pub plateaued: Vec<String>,
    pub struggling: Vec<String>,
    pub unknown: Vec<String>,
}

pub fn pace_overview<'a>(
    students: impl IntoIterator<Item = (&'a str, &'a VelocityResult)>,
) -> PaceOverview {
    let mut overview = PaceOverview::default();
    for (student_id, result) in students {
        let bucket = match result.category {
            PaceCategory::FastProgressing => &mut overview.fast_progressing,
            PaceCategory::SteadyProgressing => &mut overview.steady,
            PaceCategory::Plateaued => &mut overview.plateaued,
            PaceCategory::Struggling => &mut overview.struggling,
            PaceCategory::Unknown => &mut overview.unknown,
        };
        bucket.push(student_id.to_string());
    }
    overview
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskSeverity {
    High,
    Medium,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub student_id: String,
    pub reasons: Vec<String>,
    pub severity: RiskSeverity,
}

/// Flags low current mastery and negative velocity; `None` when neither applies.
pub fn assess_risk(
    student_id: &str,
    latest_score: f64,
    velocity: &VelocityResult,
) -> Option<RiskAssessment> {
    let mut reasons = Vec::new();
    if latest_score < LOW_MASTERY_BELOW {
        reasons.push(format!("Low Mastery ({latest_score}%)"));
    }
    if let Some(v) = velocity.velocity.filter(|v| *v < 0.0) {
        reasons.push(format!("Negative Learning Velocity ({v})"));
    }

    if reasons.is_empty() {
        return None;
    }
    let severity = if reasons.len() > 1 {
        RiskSeverity::High
    } else {
        RiskSeverity::Medium
    };
    Some(RiskAssessment {
        student_id: student_id.to_string(),
        reasons,
        severity,
    })
}
