//! Aggregation & Practice Planner
//!
//! Rollups over per-concept probabilities (module, subject, overall) on a
//! 0-100 scale, plus remedial/core/stretch bucketing for recommendations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::PracticeThresholds;
use crate::engine::round_to;
use crate::types::{ConceptMasteryState, Module};

pub type ConceptStates = HashMap<String, ConceptMasteryState>;

/// Practice buckets for one module. Concepts at or above the stretch ceiling
/// land in no bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModulePracticePlan {
    pub module_id: String,
    pub remedial: Vec<String>,
    pub core: Vec<String>,
    pub stretch: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticePlan {
    pub modules: Vec<ModulePracticePlan>,
}

impl PracticePlan {
    pub fn module(&self, module_id: &str) -> Option<&ModulePracticePlan> {
        self.modules.iter().find(|m| m.module_id == module_id)
    }
}

/// Integer concept score, truncated toward zero.
pub fn mastery_score(probability: f64) -> u32 {
    (probability * 100.0).max(0.0) as u32
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        round_to(sum / count as f64, 2)
    }
}

/// Mean of `probability × 100` over tracked concepts; untracked ids are skipped.
pub fn module_score<S: AsRef<str>>(states: &ConceptStates, concept_ids: &[S]) -> f64 {
    mean(
        concept_ids
            .iter()
            .filter_map(|id| states.get(id.as_ref()))
            .map(|state| state.probability * 100.0),
    )
}

/// Mean of module scores over the given child modules.
pub fn subject_score<'a>(
    states: &ConceptStates,
    modules: impl IntoIterator<Item = &'a Module>,
) -> f64 {
    mean(
        modules
            .into_iter()
            .map(|module| module_score(states, &module.concepts)),
    )
}

pub fn overall_score(states: &ConceptStates) -> f64 {
    mean(states.values().map(|state| state.probability * 100.0))
}

/// Concept ids below `threshold`, sorted for stable output.
pub fn weak_concepts(states: &ConceptStates, threshold: f64) -> Vec<String> {
    let mut weak: Vec<String> = states
        .iter()
        .filter(|(_, state)| state.probability < threshold)
        .map(|(id, _)| id.clone())
        .collect();
    weak.sort();
    weak
}

pub fn practice_plan<'a>(
    states: &ConceptStates,
    modules: impl IntoIterator<Item = &'a Module>,
    thresholds: &PracticeThresholds,
) -> PracticePlan {
    let modules = modules
        .into_iter()
        .map(|module| {
            let mut plan = ModulePracticePlan {
                module_id: module.module_id.clone(),
                ..Default::default()
            };
            for concept_id in &module.concepts {
                let Some(state) = states.get(concept_id) else {
                    continue;
                };
                let p = state.probability;
                if p < thresholds.remedial_below {
                    plan.remedial.push(concept_id.clone());
                } else if p < thresholds.core_below {
                    plan.core.push(concept_id.clone());
                } else if p < thresholds.stretch_below {
                    plan.stretch.push(concept_id.clone());
                }
            }
            plan
        })
        .collect();

    PracticePlan { modules }
}
