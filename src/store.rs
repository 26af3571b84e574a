//! Storage seam
//!
//! The engine never touches storage itself. Callers inject durable student
//! state and curriculum metadata through these traits; `InMemoryStore` backs
//! tests and single-process deployments.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::types::{Concept, ConceptMasteryState, Module, StudentMastery, Subject};

pub trait MasteryStore: Send + Sync {
    /// Unknown students load as an empty record.
    fn load_student(&self, student_id: &str) -> Result<StudentMastery>;

    /// Upserts the given concept states, leaving other concepts untouched.
    fn save_concepts(
        &self,
        student_id: &str,
        updates: Vec<(String, ConceptMasteryState)>,
    ) -> Result<()>;
}

pub trait CurriculumSource: Send + Sync {
    fn subject(&self, subject_id: &str) -> Option<Subject>;
    fn module(&self, module_id: &str) -> Option<Module>;
    fn concept(&self, concept_id: &str) -> Option<Concept>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    students: RwLock<HashMap<String, HashMap<String, ConceptMasteryState>>>,
    subjects: RwLock<HashMap<String, Subject>>,
    modules: RwLock<HashMap<String, Module>>,
    concepts: RwLock<HashMap<String, Concept>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_subject(&self, subject: Subject) {
        self.subjects.write().insert(subject.subject_id.clone(), subject);
    }

    pub fn put_module(&self, module: Module) {
        self.modules.write().insert(module.module_id.clone(), module);
    }

    pub fn put_concept(&self, concept: Concept) {
        self.concepts.write().insert(concept.concept_id.clone(), concept);
    }

    pub fn student_count(&self) -> usize {
        self.students.read().len()
    }
}

impl MasteryStore for InMemoryStore {
    fn load_student(&self, student_id: &str) -> Result<StudentMastery> {
        let concepts = self
            .students
            .read()
            .get(student_id)
            .cloned()
            .unwrap_or_default();
        Ok(StudentMastery {
            student_id: student_id.to_string(),
            concepts,
        })
    }

    fn save_concepts(
        &self,
        student_id: &str,
        updates: Vec<(String, ConceptMasteryState)>,
    ) -> Result<()> {
        let mut students = self.students.write();
        let record = students.entry(student_id.to_string()).or_default();
        record.extend(updates);
        Ok(())
    }
}

impl CurriculumSource for InMemoryStore {
    fn subject(&self, subject_id: &str) -> Option<Subject> {
        self.subjects.read().get(subject_id).cloned()
    }

    fn module(&self, module_id: &str) -> Option<Module> {
        self.modules.read().get(module_id).cloned()
    }

    fn concept(&self, concept_id: &str) -> Option<Concept> {
        self.concepts.read().get(concept_id).cloned()
    }
}
