use super::core::{mean_std, ForensicAnalyzer};
use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

pub const RESAVE_QUALITY: u8 = 90;
const MEAN_NORMALIZER: f64 = 50.0;

/// Output of one error level pass. `residual_map` is the brightness-scaled
/// difference image, suitable for display.
pub struct ErrorLevel {
    pub residual_map: RgbImage,
    pub max_diff: u8,
    pub scale: f32,
    pub score: f32,
}

/// Error level analysis: compare the upload against a JPEG re-save of itself.
#[derive(Debug, Clone, Copy)]
pub struct ElaAnalyzer {
    quality: u8,
}

impl Default for ElaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ElaAnalyzer {
    pub fn new() -> Self {
        Self {
            quality: RESAVE_QUALITY,
        }
    }

    pub fn resave(&self, rgb: &RgbImage) -> Result<RgbImage, AnalyzerError> {
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality).encode_image(rgb)?;
        Ok(image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)?.to_rgb8())
    }

    pub fn error_level(&self, rgb: &RgbImage) -> Result<ErrorLevel, AnalyzerError> {
        let resaved = self.resave(rgb)?;
        compare(rgb, &resaved)
    }
}

/// Scores the divergence between an image and its re-saved copy.
pub fn compare(original: &RgbImage, resaved: &RgbImage) -> Result<ErrorLevel, AnalyzerError> {
    if original.dimensions() != resaved.dimensions() {
        return Err(AnalyzerError::DimensionMismatch {
            expected: original.dimensions(),
            actual: resaved.dimensions(),
        });
    }

    let mut difference = RgbImage::new(original.width(), original.height());
    for ((out, a), b) in difference
        .iter_mut()
        .zip(original.as_raw())
        .zip(resaved.as_raw())
    {
        *out = a.abs_diff(*b);
    }

    let max_diff = difference.as_raw().iter().copied().max().unwrap_or(0);
    let scale = if max_diff == 0 {
        1.0
    } else {
        255.0 / max_diff as f32
    };

    for value in difference.iter_mut() {
        *value = (*value as f32 * scale).min(255.0) as u8;
    }

    let (mean, _) = mean_std(difference.as_raw().iter().map(|&v| v as f64))?;
    let score = (mean / MEAN_NORMALIZER).min(1.0) as f32;

    Ok(ErrorLevel {
        residual_map: difference,
        max_diff,
        scale,
        score,
    })
}

impl ForensicAnalyzer for ElaAnalyzer {
    fn sector(&self) -> Sector {
        Sector::Ela
    }

    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError> {
        let level = self.error_level(image.rgb())?;
        tracing::trace!(max_diff = level.max_diff, scale = level.scale, "ELA residual");
        Ok(Finding::new(level.score, "ELA diff analyzed"))
    }
}
