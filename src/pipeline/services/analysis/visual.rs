use super::core::{luminance, mean_std, ForensicAnalyzer};
use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};

const STD_NORMALIZER: f64 = 80.0;

/// Global luminance spread. Flat, airbrushed images score low.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualConsistencyAnalyzer;

impl VisualConsistencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ForensicAnalyzer for VisualConsistencyAnalyzer {
    fn sector(&self) -> Sector {
        Sector::Visual
    }

    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError> {
        let luma = luminance(image.rgb());
        let (_, std) = mean_std(luma.as_raw().iter().map(|&v| v as f64))?;
        let score = (std / STD_NORMALIZER).min(1.0) as f32;
        Ok(Finding::new(
            score,
            "Std deviation indicates lighting/texture inconsistency",
        ))
    }
}
