//! Mastery Engine - unified entry point for attempt processing
//!
//! Composes decay, BKT and the confidence model. Batches are grouped by
//! concept in first-appearance order; each concept's attempts are folded in
//! input order on unrounded values and rounded once at the end. When the
//! request carries an observation time, the decay floor applies before every
//! attempt, matching one-at-a-time updates through the store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::engine::{bkt, classify, confidence, decay, round_to};
use crate::error::{ensure_engagement, ensure_unit, Result};
use crate::types::{
    AssessmentAttempt, AttemptOutcome, BatchUpdateRequest, ConceptLookup, ConceptMasteryState,
    MasteryUpdateResult,
};

const EXPLANATION_SEPARATOR: &str = " | ";

/// One concept's slice of a batch, attempts kept in input order.
struct ConceptChain<'a> {
    concept_id: &'a str,
    attempts: Vec<&'a AssessmentAttempt>,
}

struct Step {
    probability: f64,
    confidence: f64,
    explanation: String,
}

#[derive(Debug, Clone, Default)]
pub struct MasteryEngine {
    config: EngineConfig,
}

impl MasteryEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies one attempt without decay.
    pub fn update_single_attempt(
        &self,
        state: &ConceptMasteryState,
        attempt: &AssessmentAttempt,
    ) -> Result<AttemptOutcome> {
        validate_state(state)?;
        let step = self.step(state.probability, state.confidence, attempt)?;
        Ok(self.finish_single(step))
    }

    /// Applies one attempt after decaying the state from its last observation to `now`.
    pub fn update_single_attempt_at(
        &self,
        state: &ConceptMasteryState,
        attempt: &AssessmentAttempt,
        now: DateTime<Utc>,
    ) -> Result<AttemptOutcome> {
        validate_state(state)?;
        let prior = self.decayed(state, Some(now))?;
        let step = self.step(prior, state.confidence, attempt)?;
        Ok(self.finish_single(step))
    }

    /// One result per distinct concept, in first-appearance order.
    ///
    /// The whole request is validated before any concept is folded, so a bad
    /// attempt rejects the batch instead of yielding partial output.
    pub fn process_batch(&self, request: &BatchUpdateRequest) -> Result<Vec<MasteryUpdateResult>> {
        let chains = self.prepare(request)?;
        chains
            .iter()
            .map(|chain| self.fold_chain(chain, request))
            .collect()
    }

    /// Same contract as [`process_batch`](Self::process_batch), folding
    /// distinct concepts on the rayon pool. Attempts within a concept are
    /// still applied sequentially.
    pub fn process_batch_parallel(
        &self,
        request: &BatchUpdateRequest,
    ) -> Result<Vec<MasteryUpdateResult>> {
        let chains = self.prepare(request)?;
        chains
            .par_iter()
            .map(|chain| self.fold_chain(chain, request))
            .collect()
    }

    fn prepare<'a>(&self, request: &'a BatchUpdateRequest) -> Result<Vec<ConceptChain<'a>>> {
        if let Err(err) = validate_request(request) {
            tracing::warn!(
                error = %err,
                student_id = %request.student_id,
                "Rejected mastery batch"
            );
            return Err(err);
        }
        let chains = group_by_concept(&request.attempts);
        tracing::debug!(
            student_id = %request.student_id,
            attempts = request.attempts.len(),
            concepts = chains.len(),
            "Processing mastery batch"
        );
        Ok(chains)
    }

    fn fold_chain(
        &self,
        chain: &ConceptChain<'_>,
        request: &BatchUpdateRequest,
    ) -> Result<MasteryUpdateResult> {
        let lookup = ConceptLookup::resolve(
            &request.current_states,
            chain.concept_id,
            &self.config.cold_start,
        );
        if lookup.is_cold_start() {
            tracing::debug!(concept_id = chain.concept_id, "Cold-start concept state");
        }
        let start = lookup.into_state();

        let mut probability = self.decayed(&start, request.observed_at)?;
        let mut confidence = start.confidence;
        let mut trail = Vec::with_capacity(chain.attempts.len());

        for (i, attempt) in chain.attempts.iter().enumerate() {
            // Later attempts see the state as observed at `observed_at`.
            if i > 0 && request.observed_at.is_some() {
                probability = decay::apply_floor(probability, &self.config.decay);
            }
            let step = self.step(probability, confidence, attempt)?;
            probability = step.probability;
            confidence = step.confidence;
            trail.push(step.explanation);
        }

        let probability = round_to(probability, 4);
        Ok(MasteryUpdateResult {
            concept_id: chain.concept_id.to_string(),
            probability,
            confidence: round_to(confidence, 4),
            status: classify(probability),
            explanation: trail.join(EXPLANATION_SEPARATOR),
        })
    }

    fn decayed(&self, state: &ConceptMasteryState, now: Option<DateTime<Utc>>) -> Result<f64> {
        match (state.last_observed, now) {
            (Some(last), Some(now)) => {
                decay::decay_since(state.probability, last, now, &self.config.decay)
            }
            _ => Ok(state.probability),
        }
    }

    fn step(
        &self,
        prior: f64,
        current_confidence: f64,
        attempt: &AssessmentAttempt,
    ) -> Result<Step> {
        let params = &self.config.bkt;
        let engagement = bkt::clamp_engagement(attempt.engagement, params)?;
        let posterior = bkt::update_raw(prior, attempt.correct, attempt.engagement, params)?;
        let next_confidence = confidence::update_confidence(
            current_confidence,
            prior,
            posterior,
            engagement,
            &self.config.confidence,
        );

        tracing::debug!(
            concept_id = %attempt.concept_id,
            correct = attempt.correct,
            engagement,
            prior,
            posterior,
            "Applied BKT update"
        );

        Ok(Step {
            probability: posterior,
            confidence: next_confidence,
            explanation: confidence::explain(attempt.correct, prior, posterior, engagement, params),
        })
    }

    fn finish_single(&self, step: Step) -> AttemptOutcome {
        let probability = round_to(step.probability, 4);
        AttemptOutcome {
            probability,
            confidence: round_to(step.confidence, 4),
            status: classify(probability),
            explanation: step.explanation,
        }
    }
}

fn validate_state(state: &ConceptMasteryState) -> Result<()> {
    ensure_unit("probability", state.probability)?;
    ensure_unit("confidence", state.confidence)?;
    Ok(())
}

fn validate_request(request: &BatchUpdateRequest) -> Result<()> {
    for attempt in &request.attempts {
        ensure_engagement(attempt.engagement)?;
        if let Some(state) = request.current_states.get(&attempt.concept_id) {
            validate_state(state)?;
        }
    }
    Ok(())
}

/// Stable grouping: concepts ordered by first appearance, attempts by input order.
fn group_by_concept(attempts: &[AssessmentAttempt]) -> Vec<ConceptChain<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut chains: Vec<ConceptChain<'_>> = Vec::new();

    for attempt in attempts {
        let slot = *index.entry(attempt.concept_id.as_str()).or_insert_with(|| {
            chains.push(ConceptChain {
                concept_id: attempt.concept_id.as_str(),
                attempts: Vec::new(),
            });
            chains.len() - 1
        });
        chains[slot].attempts.push(attempt);
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MasteryError;
    use crate::types::MasteryStatus;
    use chrono::{Duration, TimeZone};

    fn attempt(concept: &str, correct: bool, engagement: f64) -> AssessmentAttempt {
        AssessmentAttempt::new(concept, correct, engagement)
    }

    fn request(attempts: Vec<AssessmentAttempt>) -> BatchUpdateRequest {
        BatchUpdateRequest {
            student_id: "s1".to_string(),
            attempts,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_attempt_cold_start() {
        let engine = MasteryEngine::default();
        let state = ConceptMasteryState::cold_start(engine.config());
        let outcome = engine
            .update_single_attempt(&state, &attempt("c1", true, 1.0))
            .unwrap();

        assert_eq!(outcome.probability, 0.6927);
        assert_eq!(outcome.confidence, 0.2963);
        assert_eq!(outcome.status, MasteryStatus::Proficient);
        assert!(outcome.explanation.contains("30.0% -> 69.3%"));
    }

    #[test]
    fn test_single_attempt_rejects_bad_state() {
        let engine = MasteryEngine::default();
        let state = ConceptMasteryState::new(0.5, 1.4);
        let err = engine
            .update_single_attempt(&state, &attempt("c1", true, 1.0))
            .unwrap_err();
        assert_eq!(err, MasteryError::InvalidProbability { field: "confidence", value: 1.4 });
    }

    #[test]
    fn test_single_attempt_at_decays_first() {
        let engine = MasteryEngine::default();
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let state = ConceptMasteryState::new(0.8, 0.5).observed_at(last);

        let fresh = engine
            .update_single_attempt_at(&state, &attempt("c1", true, 1.0), last)
            .unwrap();
        let stale = engine
            .update_single_attempt_at(&state, &attempt("c1", true, 1.0), last + Duration::days(60))
            .unwrap();
        assert!(stale.probability < fresh.probability);
        assert_eq!(fresh, engine.update_single_attempt(&state, &attempt("c1", true, 1.0)).unwrap());
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let engine = MasteryEngine::default();
        assert!(engine.process_batch(&request(vec![])).unwrap().is_empty());
    }

    #[test]
    fn test_batch_groups_in_first_appearance_order() {
        let engine = MasteryEngine::default();
        let results = engine
            .process_batch(&request(vec![
                attempt("b", false, 1.0),
                attempt("a", true, 1.0),
                attempt("b", true, 1.0),
                attempt("a", true, 1.0),
            ]))
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        // 0.3 -> 0.69268 -> 0.91923
        assert_eq!(results[1].probability, 0.9192);
        assert_eq!(results[1].status, MasteryStatus::Mastered);
        assert_eq!(results[1].explanation.matches(EXPLANATION_SEPARATOR).count(), 1);
    }

    #[test]
    fn test_batch_order_within_concept_matters() {
        let engine = MasteryEngine::default();
        let right_then_wrong = engine
            .process_batch(&request(vec![attempt("a", true, 1.0), attempt("a", false, 1.0)]))
            .unwrap();
        let wrong_then_right = engine
            .process_batch(&request(vec![attempt("a", false, 1.0), attempt("a", true, 1.0)]))
            .unwrap();
        assert_ne!(right_then_wrong[0].probability, wrong_then_right[0].probability);
    }

    #[test]
    fn test_batch_uses_existing_state() {
        let engine = MasteryEngine::default();
        let mut req = request(vec![attempt("a", false, 1.0)]);
        req.current_states
            .insert("a".to_string(), ConceptMasteryState::new(0.8, 0.4));
        let results = engine.process_batch(&req).unwrap();
        assert_eq!(results[0].probability, 0.4);
        assert_eq!(results[0].status, MasteryStatus::Developing);
        assert_eq!(results[0].confidence, 0.6);
    }

    #[test]
    fn test_batch_rejects_whole_request_on_bad_engagement() {
        let engine = MasteryEngine::default();
        let err = engine
            .process_batch(&request(vec![attempt("a", true, 1.0), attempt("b", true, -1.0)]))
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_batch_decays_stored_state() {
        let engine = MasteryEngine::default();
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut req = request(vec![attempt("a", true, 1.0)]);
        req.current_states
            .insert("a".to_string(), ConceptMasteryState::new(0.8, 0.4).observed_at(last));

        let undecayed = engine.process_batch(&req).unwrap();
        req.observed_at = Some(last + Duration::days(90));
        let decayed = engine.process_batch(&req).unwrap();
        assert!(decayed[0].probability < undecayed[0].probability);
    }

    #[test]
    fn test_batch_agrees_with_single_attempts_below_floor() {
        let engine = MasteryEngine::default();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let start = ConceptMasteryState::new(0.1, 0.2).observed_at(t);
        let attempts = vec![attempt("a", false, 0.5), attempt("a", false, 0.5)];

        let mut req = request(attempts.clone());
        req.current_states.insert("a".to_string(), start.clone());
        req.observed_at = Some(t);
        let batch = engine.process_batch(&req).unwrap();

        let mut state = start;
        for a in &attempts {
            let outcome = engine.update_single_attempt_at(&state, a, t).unwrap();
            state =
                ConceptMasteryState::new(outcome.probability, outcome.confidence).observed_at(t);
        }

        assert_eq!(batch[0].probability, 0.063);
        assert_eq!(batch[0].probability, state.probability);
    }

    #[test]
    fn test_batch_without_observation_time_skips_floor() {
        let engine = MasteryEngine::default();
        let mut req = request(vec![attempt("a", false, 0.5), attempt("a", false, 0.5)]);
        req.current_states
            .insert("a".to_string(), ConceptMasteryState::new(0.1, 0.2));
        let results = engine.process_batch(&req).unwrap();
        assert!(results[0].probability < 0.063);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = MasteryEngine::default();
        let attempts: Vec<AssessmentAttempt> = (0..60)
            .map(|i| attempt(&format!("c{}", i % 7), i % 3 != 0, 0.5 + (i % 5) as f64 * 0.25))
            .collect();
        let req = request(attempts);
        assert_eq!(
            engine.process_batch(&req).unwrap(),
            engine.process_batch_parallel(&req).unwrap()
        );
    }

    #[test]
    fn test_new_validates_config() {
        let mut config = EngineConfig::default();
        config.bkt.p_slip = 1.0;
        assert!(MasteryEngine::new(config).is_err());
    }
}
