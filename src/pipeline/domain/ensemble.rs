use super::sector::AnalyzerResult;
use serde::Serialize;

const FAKE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    #[serde(rename = "Real")]
    Real,
    #[serde(rename = "Fake/Synthetic")]
    FakeOrSynthetic,
}

impl Label {
    /// Strictly above the threshold is fake; exactly 0.5 stays real.
    pub fn from_score(score: f32) -> Self {
        if score > FAKE_THRESHOLD {
            Label::FakeOrSynthetic
        } else {
            Label::Real
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleResult {
    pub ensemble_score: f32,
    pub overall_label: Label,
    #[serde(rename = "scores")]
    pub breakdown: [AnalyzerResult; 5],
}

impl EnsembleResult {
    /// Equal-weight mean of the five sector scores.
    pub fn aggregate(mut breakdown: [AnalyzerResult; 5]) -> Self {
        breakdown.sort_by_key(|result| result.sector);
        let sum: f32 = breakdown.iter().map(|result| result.score).sum();
        let ensemble_score = sum / breakdown.len() as f32;

        Self {
            ensemble_score,
            overall_label: Label::from_score(ensemble_score),
            breakdown,
        }
    }

    pub fn scores(&self) -> [f32; 5] {
        std::array::from_fn(|i| self.breakdown[i].score)
    }
}
