//! Common Types
//!
//! Shared data structures passed between the engine, the planner and the
//! caller-owned storage.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ColdStartParams, EngineConfig};

// ==================== Mastery State ====================

/// Belief about one (student, concept) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptMasteryState {
    /// Estimated P(student knows concept), in [0, 1]
    pub probability: f64,
    /// Reliability of `probability`, in [0, 1]
    pub confidence: f64,
    /// Time of the most recent incorporated attempt; `None` disables decay
    #[serde(default)]
    pub last_observed: Option<DateTime<Utc>>,
}

impl ConceptMasteryState {
    pub fn new(probability: f64, confidence: f64) -> Self {
        Self {
            probability,
            confidence,
            last_observed: None,
        }
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_observed = Some(at);
        self
    }

    pub fn cold_start(config: &EngineConfig) -> Self {
        Self::from_cold_start(&config.cold_start)
    }

    pub fn from_cold_start(params: &ColdStartParams) -> Self {
        Self::new(params.probability, params.confidence)
    }
}

/// Result of resolving a concept's state, keeping cold-start creation visible.
#[derive(Clone, Debug, PartialEq)]
pub enum ConceptLookup {
    Existing(ConceptMasteryState),
    ColdStart(ConceptMasteryState),
}

impl ConceptLookup {
    pub fn resolve(
        states: &HashMap<String, ConceptMasteryState>,
        concept_id: &str,
        cold_start: &ColdStartParams,
    ) -> Self {
        match states.get(concept_id) {
            Some(state) => ConceptLookup::Existing(state.clone()),
            None => ConceptLookup::ColdStart(ConceptMasteryState::from_cold_start(cold_start)),
        }
    }

    pub fn is_cold_start(&self) -> bool {
        matches!(self, ConceptLookup::ColdStart(_))
    }

    pub fn state(&self) -> &ConceptMasteryState {
        match self {
            ConceptLookup::Existing(state) | ConceptLookup::ColdStart(state) => state,
        }
    }

    pub fn into_state(self) -> ConceptMasteryState {
        match self {
            ConceptLookup::Existing(state) | ConceptLookup::ColdStart(state) => state,
        }
    }
}

/// All tracked concept states for one student.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentMastery {
    pub student_id: String,
    pub concepts: HashMap<String, ConceptMasteryState>,
}

impl StudentMastery {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            concepts: HashMap::new(),
        }
    }

    pub fn get_or_cold_start(
        &self,
        concept_id: &str,
        cold_start: &ColdStartParams,
    ) -> ConceptLookup {
        ConceptLookup::resolve(&self.concepts, concept_id, cold_start)
    }
}

// ==================== Attempts ====================

/// One answered assessment item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub concept_id: String,
    pub correct: bool,
    /// Attentiveness multiplier, meaningful range ~0.5-1.5
    #[serde(default = "default_engagement")]
    pub engagement: f64,
}

fn default_engagement() -> f64 {
    1.0
}

impl AssessmentAttempt {
    pub fn new(concept_id: impl Into<String>, correct: bool, engagement: f64) -> Self {
        Self {
            concept_id: concept_id.into(),
            correct,
            engagement,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub student_id: String,
    #[serde(default)]
    pub current_states: HashMap<String, ConceptMasteryState>,
    pub attempts: Vec<AssessmentAttempt>,
    /// When set, stored states with `last_observed` are decayed to this instant
    /// before their first attempt.
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

// ==================== Results ====================

/// Qualitative mastery label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasteryStatus {
    #[serde(rename = "Not Ready")]
    NotReady,
    Developing,
    Proficient,
    Mastered,
}

impl MasteryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MasteryStatus::NotReady => "Not Ready",
            MasteryStatus::Developing => "Developing",
            MasteryStatus::Proficient => "Proficient",
            MasteryStatus::Mastered => "Mastered",
        }
    }
}

impl fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single attempt applied to a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub probability: f64,
    pub confidence: f64,
    pub status: MasteryStatus,
    pub explanation: String,
}

/// Aggregated outcome for one concept touched by a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryUpdateResult {
    pub concept_id: String,
    pub probability: f64,
    pub confidence: f64,
    pub status: MasteryStatus,
    pub explanation: String,
}

// ==================== Curriculum ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub name: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub module_id: String,
    pub name: String,
    pub subject_id: String,
    #[serde(default)]
    pub concepts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub concept_id: String,
    pub name: String,
    pub module_id: String,
    pub subject_id: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}
