use crate::types::MasteryStatus;

const DEVELOPING_FROM: f64 = 0.4;
const PROFICIENT_FROM: f64 = 0.6;
const MASTERED_FROM: f64 = 0.8;

/// Maps a probability to its label; each band includes its lower edge.
pub fn classify(probability: f64) -> MasteryStatus {
    if probability < DEVELOPING_FROM {
        MasteryStatus::NotReady
    } else if probability < PROFICIENT_FROM {
        MasteryStatus::Developing
    } else if probability < MASTERED_FROM {
        MasteryStatus::Proficient
    } else {
        MasteryStatus::Mastered
    }
}

/// Same bands over a 0-100 score.
pub fn classify_score(score: f64) -> MasteryStatus {
    classify(score / 100.0)
}
