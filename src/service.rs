//! Mastery service - engine composed with injected storage
//!
//! Record flow: load student -> decay-aware batch -> upsert states.
//! Report flows read the stored states and curriculum and never mutate them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::classifier::classify_score;
use crate::engine::{classify, round_to, MasteryEngine};
use crate::error::Result;
use crate::planner::{self, PracticePlan};
use crate::store::{CurriculumSource, MasteryStore};
use crate::types::{
    AssessmentAttempt, BatchUpdateRequest, ConceptMasteryState, MasteryStatus,
    MasteryUpdateResult, Module,
};

const STRONG_MODULE_FROM: f64 = 75.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptReport {
    pub concept_id: String,
    /// Curriculum name, or the id when the concept is not registered
    pub concept: String,
    pub mastery_score: u32,
    pub probability: f64,
    pub status: MasteryStatus,
    pub cold_start: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub module_id: String,
    pub module: String,
    pub mastery: f64,
    pub weak_concepts: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStanding {
    Strong,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module_id: String,
    pub module: String,
    pub mastery: f64,
    pub standing: ModuleStanding,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject_id: String,
    pub subject: String,
    pub subject_mastery: f64,
    pub modules: Vec<ModuleSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentOverview {
    pub student_id: String,
    pub overall_mastery: f64,
    pub status: MasteryStatus,
}

pub struct MasteryService<S, C> {
    engine: MasteryEngine,
    store: Arc<S>,
    curriculum: Arc<C>,
}

impl<S: MasteryStore, C: CurriculumSource> MasteryService<S, C> {
    pub fn new(engine: MasteryEngine, store: Arc<S>, curriculum: Arc<C>) -> Self {
        Self {
            engine,
            store,
            curriculum,
        }
    }

    pub fn engine(&self) -> &MasteryEngine {
        &self.engine
    }

    pub fn record_attempts(
        &self,
        student_id: &str,
        attempts: Vec<AssessmentAttempt>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MasteryUpdateResult>> {
        if attempts.is_empty() {
            return Ok(Vec::new());
        }

        let student = self.store.load_student(student_id)?;
        let request = BatchUpdateRequest {
            student_id: student_id.to_string(),
            current_states: student.concepts,
            attempts,
            observed_at: Some(now),
        };
        let results = self.engine.process_batch(&request)?;

        let updates = results
            .iter()
            .map(|r| {
                (
                    r.concept_id.clone(),
                    ConceptMasteryState::new(r.probability, r.confidence).observed_at(now),
                )
            })
            .collect();
        if let Err(err) = self.store.save_concepts(student_id, updates) {
            tracing::warn!(error = %err, student_id = %student_id, "Failed to save mastery state");
            return Err(err);
        }

        tracing::info!(
            student_id = %student_id,
            attempts = request.attempts.len(),
            concepts = results.len(),
            "Recorded assessment attempts"
        );
        Ok(results)
    }

    pub fn concept_report(&self, student_id: &str, concept_id: &str) -> Result<ConceptReport> {
        let student = self.store.load_student(student_id)?;
        let lookup = student.get_or_cold_start(concept_id, &self.engine.config().cold_start);
        let cold_start = lookup.is_cold_start();
        let probability = lookup.state().probability;

        let concept = self
            .curriculum
            .concept(concept_id)
            .map(|c| c.name)
            .unwrap_or_else(|| concept_id.to_string());

        Ok(ConceptReport {
            concept_id: concept_id.to_string(),
            concept,
            mastery_score: planner::mastery_score(probability),
            probability: round_to(probability, 2),
            status: classify(probability),
            cold_start,
        })
    }

    /// Module score plus every weak concept the student has, not only this module's.
    pub fn module_report(&self, student_id: &str, module_id: &str) -> Result<ModuleReport> {
        let Some(module) = self.curriculum.module(module_id) else {
            return Ok(ModuleReport {
                module_id: module_id.to_string(),
                module: module_id.to_string(),
                mastery: 0.0,
                weak_concepts: Vec::new(),
            });
        };

        let student = self.store.load_student(student_id)?;
        let threshold = self.engine.config().practice.weak_below;
        let weak_concepts = planner::weak_concepts(&student.concepts, threshold);

        Ok(ModuleReport {
            mastery: planner::module_score(&student.concepts, &module.concepts),
            module_id: module.module_id,
            module: module.name,
            weak_concepts,
        })
    }

    pub fn subject_report(&self, student_id: &str, subject_id: &str) -> Result<SubjectReport> {
        let Some(subject) = self.curriculum.subject(subject_id) else {
            return Ok(SubjectReport {
                subject_id: subject_id.to_string(),
                subject: subject_id.to_string(),
                subject_mastery: 0.0,
                modules: Vec::new(),
            });
        };

        let student = self.store.load_student(student_id)?;
        let modules = self.subject_modules(&subject.modules);

        let summaries = modules
            .iter()
            .map(|module| {
                let mastery = planner::module_score(&student.concepts, &module.concepts);
                ModuleSummary {
                    module_id: module.module_id.clone(),
                    module: module.name.clone(),
                    mastery,
                    standing: if mastery >= STRONG_MODULE_FROM {
                        ModuleStanding::Strong
                    } else {
                        ModuleStanding::NeedsAttention
                    },
                }
            })
            .collect();

        Ok(SubjectReport {
            subject_mastery: planner::subject_score(&student.concepts, &modules),
            subject_id: subject.subject_id,
            subject: subject.name,
            modules: summaries,
        })
    }

    pub fn practice_plan(&self, student_id: &str, subject_id: &str) -> Result<PracticePlan> {
        let Some(subject) = self.curriculum.subject(subject_id) else {
            return Ok(PracticePlan::default());
        };
        let student = self.store.load_student(student_id)?;
        let modules = self.subject_modules(&subject.modules);
        Ok(planner::practice_plan(
            &student.concepts,
            &modules,
            &self.engine.config().practice,
        ))
    }

    pub fn student_overview(&self, student_id: &str) -> Result<StudentOverview> {
        let student = self.store.load_student(student_id)?;
        let overall_mastery = planner::overall_score(&student.concepts);
        Ok(StudentOverview {
            student_id: student_id.to_string(),
            overall_mastery,
            status: classify_score(overall_mastery),
        })
    }

    /// Registered child modules, in subject order; unknown ids are skipped.
    fn subject_modules(&self, module_ids: &[String]) -> Vec<Module> {
        module_ids
            .iter()
            .filter_map(|id| {
                let module = self.curriculum.module(id);
                if module.is_none() {
                    tracing::debug!(module_id = %id, "Subject references unknown module");
                }
                module
            })
            .collect()
    }
}

