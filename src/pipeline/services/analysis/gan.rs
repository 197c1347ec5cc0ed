use super::core::ForensicAnalyzer;
use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};
use crate::pipeline::services::learned::LearnedSignalProvider;
use std::sync::Arc;

/// Learned-model sector. Delegates to whatever provider was loaded at startup.
#[derive(Clone)]
pub struct GanDetectionAnalyzer {
    provider: Arc<dyn LearnedSignalProvider>,
}

impl GanDetectionAnalyzer {
    pub fn new(provider: Arc<dyn LearnedSignalProvider>) -> Self {
        Self { provider }
    }
}

impl ForensicAnalyzer for GanDetectionAnalyzer {
    fn sector(&self) -> Sector {
        Sector::GanDetection
    }

    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError> {
        let score = self.provider.synthetic_likelihood(image.rgb())?;
        Ok(Finding::new(
            score,
            format!("Pretrained {} used (placeholder)", self.provider.name()),
        ))
    }
}
