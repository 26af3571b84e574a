//! Error types for the mastery engine.

use thiserror::Error;

/// All errors the engine and its storage seam can report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MasteryError {
    /// A probability-like value (prior, stored probability, confidence) outside `[0, 1]`.
    #[error("{field} out of range [0.0, 1.0]: {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    /// Engagement must be a finite, non-negative multiplier.
    #[error("engagement must be finite and non-negative: {0}")]
    InvalidEngagement(f64),

    /// Engine parameters that fail validation.
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    /// Failure reported by a `MasteryStore` implementation.
    #[error("storage error: {0}")]
    Storage(String),
}

impl MasteryError {
    /// True for errors caused by caller-supplied values, which an API layer
    /// should surface as a client error rather than a server fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MasteryError::InvalidProbability { .. } | MasteryError::InvalidEngagement(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MasteryError>;

/// Rejects values outside the closed unit interval, including NaN.
pub(crate) fn ensure_unit(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MasteryError::InvalidProbability { field, value })
    }
}

pub(crate) fn ensure_engagement(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MasteryError::InvalidEngagement(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval_bounds() {
        assert_eq!(ensure_unit("prior", 0.0), Ok(0.0));
        assert_eq!(ensure_unit("prior", 1.0), Ok(1.0));
        assert!(ensure_unit("prior", -0.0001).is_err());
        assert!(ensure_unit("prior", 1.0001).is_err());
        assert!(ensure_unit("prior", f64::NAN).is_err());
    }

    #[test]
    fn test_engagement_rejects_negative_only() {
        assert!(ensure_engagement(0.0).is_ok());
        assert!(ensure_engagement(7.5).is_ok());
        assert_eq!(
            ensure_engagement(-0.1),
            Err(MasteryError::InvalidEngagement(-0.1))
        );
        assert!(ensure_engagement(f64::INFINITY).is_err());
    }

    #[test]
    fn test_invalid_input_classification() {
        assert!(MasteryError::InvalidEngagement(-1.0).is_invalid_input());
        assert!(MasteryError::InvalidProbability { field: "prior", value: 2.0 }.is_invalid_input());
        assert!(!MasteryError::Storage("down".into()).is_invalid_input());
        assert!(!MasteryError::InvalidConfig("p_t".into()).is_invalid_input());
    }

    #[test]
    fn test_display_names_field() {
        let err = MasteryError::InvalidProbability { field: "confidence", value: 1.5 };
        assert_eq!(err.to_string(), "confidence out of range [0.0, 1.0]: 1.5");
    }
}
