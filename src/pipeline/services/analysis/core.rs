use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};
use image::{GrayImage, Luma, RgbImage};

/// Strategy pattern for forensic signals. Implementations are pure with
/// respect to the image; any fault is returned, never swallowed, and the
/// fail-soft layer turns it into a degraded score.
pub trait ForensicAnalyzer: Send + Sync {
    fn sector(&self) -> Sector;
    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError>;
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded half up.
pub fn luminance(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([luma as u8])
    })
}

/// Population mean and standard deviation, accumulated in f64.
pub fn mean_std<I>(values: I) -> Result<(f64, f64), AnalyzerError>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0u64;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;

    // Welford
    for value in values {
        count += 1;
        let delta = value - mean;
        mean += delta / count as f64;
        m2 += delta * (value - mean);
    }

    if count == 0 {
        return Err(AnalyzerError::EmptyImage);
    }

    Ok((mean, (m2 / count as f64).sqrt()))
}
