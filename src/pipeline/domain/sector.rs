use serde::Serialize;
use std::fmt;

/// One forensic signal. Declaration order is the fixed breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Sector {
    #[serde(rename = "Metadata")]
    Metadata,
    #[serde(rename = "ELA")]
    Ela,
    #[serde(rename = "Noise/PRNU")]
    Noise,
    #[serde(rename = "GAN Detection")]
    GanDetection,
    #[serde(rename = "Visual Checks")]
    Visual,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::Metadata,
        Sector::Ela,
        Sector::Noise,
        Sector::GanDetection,
        Sector::Visual,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Metadata => "Metadata",
            Sector::Ela => "ELA",
            Sector::Noise => "Noise/PRNU",
            Sector::GanDetection => "GAN Detection",
            Sector::Visual => "Visual Checks",
        }
    }

    /// Score reported when the analyzer for this sector fails internally.
    pub fn fallback_score(&self) -> f32 {
        match self {
            Sector::Metadata => 0.2,
            Sector::Ela => 0.2,
            Sector::Noise => 0.2,
            Sector::GanDetection => 0.5, // neutral
            Sector::Visual => 0.4,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Sector::Metadata => "Error reading EXIF",
            Sector::Ela => "ELA error",
            Sector::Noise => "Error in PRNU",
            Sector::GanDetection => "GAN detection error",
            Sector::Visual => "Visual check error",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw output of an analyzer before it is pinned to a sector.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub score: f32,
    pub reason: String,
}

impl Finding {
    pub fn new(score: f32, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerResult {
    pub sector: Sector,
    pub score: f32,
    pub reason: String,
}

impl AnalyzerResult {
    /// Pins a finding to its sector, clamping the score into [0, 1].
    /// Non-finite scores are treated as an analyzer failure.
    pub fn from_finding(sector: Sector, finding: Finding) -> Self {
        if !finding.score.is_finite() {
            return Self::degraded(sector, &crate::error::AnalyzerError::NonFiniteScore);
        }
        Self {
            sector,
            score: finding.score.clamp(0.0, 1.0),
            reason: finding.reason,
        }
    }

    pub fn degraded(sector: Sector, cause: &dyn fmt::Display) -> Self {
        Self {
            sector,
            score: sector.fallback_score(),
            reason: format!("{}: {}", sector.failure_prefix(), cause),
        }
    }
}
