//! # gyansetu-mastery - concept mastery engine
//!
//! Estimates, per student and per concept, the probability that the student
//! has mastered that concept:
//!
//! - **Decay** - stale estimates drift down toward a floor over elapsed days
//! - **BKT** - two-state Bayesian Knowledge Tracing with guess/slip noise,
//!   adjusted by an engagement multiplier
//! - **Confidence** - a separate reliability score that grows with each update
//! - **Batch** - folds many attempts into one transition per concept
//! - **Planner** - module/subject/overall rollups and practice buckets
//! - **Pace** - learning velocity over mastery snapshots
//!
//! ## Module structure
//!
//! - [`engine`] - decay, BKT, confidence, status classifier, batch orchestration
//! - [`planner`] - aggregation and practice-plan bucketing
//! - [`pace`] - mastery velocity and at-risk detection
//! - [`store`] - storage seam injected by the caller, plus an in-memory store
//! - [`service`] - engine + store composition for record and report flows
//! - [`config`] - tunable parameters
//! - [`types`] - shared data structures
//! - [`error`] - error type
//!
//! ## Example
//!
//! ```rust
//! use gyansetu_mastery::{AssessmentAttempt, ConceptMasteryState, MasteryEngine, MasteryStatus};
//!
//! let engine = MasteryEngine::default();
//! let state = ConceptMasteryState::cold_start(engine.config());
//! let attempt = AssessmentAttempt::new("fractions", true, 1.0);
//!
//! let outcome = engine.update_single_attempt(&state, &attempt).unwrap();
//! assert_eq!(outcome.probability, 0.6927);
//! assert_eq!(outcome.status, MasteryStatus::Proficient);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod pace;
pub mod planner;
pub mod service;
pub mod store;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{
    BktParams, ColdStartParams, ConfidenceParams, DecayParams, EngineConfig, PracticeThresholds,
};
pub use engine::{classify, MasteryEngine};
pub use error::{MasteryError, Result};
pub use pace::{
    MasterySnapshot, PaceCategory, PaceTrend, RiskAssessment, RiskSeverity, VelocityResult,
};
pub use planner::{ModulePracticePlan, PracticePlan};
pub use service::MasteryService;
pub use store::{CurriculumSource, InMemoryStore, MasteryStore};
pub use types::*;
