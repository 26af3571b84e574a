use serde::{Deserialize, Serialize};

use crate::error::{MasteryError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BktParams {
    /// Learning transition probability P(T)
    pub p_transit: f64,
    /// Slip probability P(S)
    pub p_slip: f64,
    /// Guess probability P(G)
    pub p_guess: f64,
    pub min_engagement: f64,
    pub max_engagement: f64,
    /// Below this engagement a correct answer is treated as a possible lucky guess.
    pub low_engagement_threshold: f64,
    pub guess_inflation: f64,
    pub max_guess: f64,
    /// Above this engagement an incorrect answer is trusted as a genuine failure.
    pub high_engagement_threshold: f64,
    pub slip_reduction: f64,
    pub min_slip: f64,
    pub max_transit: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            p_transit: 0.1,
            p_slip: 0.1,
            p_guess: 0.2,
            min_engagement: 0.5,
            max_engagement: 1.5,
            low_engagement_threshold: 0.8,
            guess_inflation: 1.5,
            max_guess: 0.5,
            high_engagement_threshold: 1.2,
            slip_reduction: 0.5,
            min_slip: 0.01,
            max_transit: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayParams {
    /// Fraction of mastery lost per elapsed day
    pub rate: f64,
    pub floor: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            rate: 0.01,
            floor: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceParams {
    pub gain: f64,
    pub max_confidence: f64,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        Self {
            gain: 0.5,
            max_confidence: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdStartParams {
    pub probability: f64,
    pub confidence: f64,
}

impl Default for ColdStartParams {
    fn default() -> Self {
        Self {
            probability: 0.3,
            confidence: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeThresholds {
    pub remedial_below: f64,
    pub core_below: f64,
    pub stretch_below: f64,
    pub weak_below: f64,
}

impl Default for PracticeThresholds {
    fn default() -> Self {
        Self {
            remedial_below: 0.4,
            core_below: 0.75,
            stretch_below: 0.85,
            weak_below: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bkt: BktParams,
    pub decay: DecayParams,
    pub confidence: ConfidenceParams,
    pub cold_start: ColdStartParams,
    pub practice: PracticeThresholds,
}

impl EngineConfig {
    /// Loads a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| MasteryError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let bkt = &self.bkt;
        open_unit("bkt.p_transit", bkt.p_transit)?;
        open_unit("bkt.p_slip", bkt.p_slip)?;
        open_unit("bkt.p_guess", bkt.p_guess)?;
        open_unit("bkt.max_guess", bkt.max_guess)?;
        open_unit("bkt.min_slip", bkt.min_slip)?;
        half_open_unit("bkt.max_transit", bkt.max_transit)?;
        if !(bkt.max_guess >= bkt.p_guess) {
            return Err(MasteryError::InvalidConfig(format!(
                "bkt.max_guess must be >= bkt.p_guess: {} < {}",
                bkt.max_guess, bkt.p_guess
            )));
        }
        if !(bkt.min_engagement > 0.0 && bkt.min_engagement <= bkt.max_engagement) {
            return Err(MasteryError::InvalidConfig(format!(
                "engagement range [{}, {}] is empty or non-positive",
                bkt.min_engagement, bkt.max_engagement
            )));
        }
        if !(bkt.guess_inflation >= 1.0) {
            return Err(MasteryError::InvalidConfig(format!(
                "bkt.guess_inflation must be >= 1.0: {}",
                bkt.guess_inflation
            )));
        }
        half_open_unit("bkt.slip_reduction", bkt.slip_reduction)?;

        if !(0.0..1.0).contains(&self.decay.rate) {
            return Err(MasteryError::InvalidConfig(format!(
                "decay.rate must be in [0, 1): {}",
                self.decay.rate
            )));
        }
        half_open_unit("decay.floor", self.decay.floor)?;

        if !(self.confidence.gain >= 0.0) {
            return Err(MasteryError::InvalidConfig(format!(
                "confidence.gain must be >= 0: {}",
                self.confidence.gain
            )));
        }
        half_open_unit("confidence.max_confidence", self.confidence.max_confidence)?;

        open_unit("cold_start.probability", self.cold_start.probability)?;
        if !(0.0..=self.confidence.max_confidence).contains(&self.cold_start.confidence) {
            return Err(MasteryError::InvalidConfig(format!(
                "cold_start.confidence must be in [0, {}]: {}",
                self.confidence.max_confidence, self.cold_start.confidence
            )));
        }

        let p = &self.practice;
        if !(p.remedial_below <= p.core_below && p.core_below <= p.stretch_below) {
            return Err(MasteryError::InvalidConfig(format!(
                "practice thresholds must be ordered: {} <= {} <= {}",
                p.remedial_below, p.core_below, p.stretch_below
            )));
        }
        if !(0.0..=1.0).contains(&p.weak_below) {
            return Err(MasteryError::InvalidConfig(format!(
                "practice.weak_below must be in [0, 1]: {}",
                p.weak_below
            )));
        }
        Ok(())
    }
}

fn open_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(MasteryError::InvalidConfig(format!(
            "{name} must be in (0, 1): {value}"
        )))
    }
}

fn half_open_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(MasteryError::InvalidConfig(format!(
            "{name} must be in (0, 1]: {value}"
        )))
    }
}
