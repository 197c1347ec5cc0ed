use super::core::{luminance, mean_std, ForensicAnalyzer};
use crate::common::LoadedImage;
use crate::error::AnalyzerError;
use crate::pipeline::domain::{Finding, Sector};
use image::GrayImage;

const STD_NORMALIZER: f64 = 10.0;
// 3-tap Gaussian, sigma derived from the kernel size (0.8).
const KERNEL: [f32; 3] = [0.25, 0.5, 0.25];

/// High-pass residual energy as a stand-in for sensor noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseResidualAnalyzer;

impl NoiseResidualAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// `luma - blur(luma)` in row-major order.
    pub fn residual(&self, luma: &GrayImage) -> Vec<f32> {
        let (width, height) = luma.dimensions();
        let (w, h) = (width as usize, height as usize);
        let source: Vec<f32> = luma.as_raw().iter().map(|&v| v as f32).collect();

        let mut horizontal = vec![0.0f32; source.len()];
        for y in 0..h {
            let row = &source[y * w..(y + 1) * w];
            for x in 0..w {
                horizontal[y * w + x] = convolve(|i| row[reflect_101(i, w)], x);
            }
        }

        let mut residual = vec![0.0f32; source.len()];
        for y in 0..h {
            for x in 0..w {
                let blurred = convolve(|i| horizontal[reflect_101(i, h) * w + x], y);
                residual[y * w + x] = source[y * w + x] - blurred;
            }
        }
        residual
    }
}

fn convolve(sample: impl Fn(isize) -> f32, center: usize) -> f32 {
    let center = center as isize;
    KERNEL
        .iter()
        .enumerate()
        .map(|(k, weight)| weight * sample(center + k as isize - 1))
        .sum()
}

// gfedcb|abcdefgh|gfedcba
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let reflected = if index < 0 {
        -index
    } else if index > last {
        2 * last - index
    } else {
        index
    };
    reflected as usize
}

impl ForensicAnalyzer for NoiseResidualAnalyzer {
    fn sector(&self) -> Sector {
        Sector::Noise
    }

    fn analyze(&self, image: &LoadedImage) -> Result<Finding, AnalyzerError> {
        let luma = luminance(image.rgb());
        let residual = self.residual(&luma);
        let (_, std) = mean_std(residual.iter().map(|&v| v as f64))?;
        let score = (std / STD_NORMALIZER).min(1.0) as f32;
        Ok(Finding::new(score, "Noise residual heatmap generated"))
    }
}
