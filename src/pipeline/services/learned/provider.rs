use crate::error::AnalyzerError;
use image::imageops::FilterType;
use image::RgbImage;

/// Anything that can turn an image into a synthetic-likelihood score in [0, 1].
///
/// The bundled ONNX classifier is a placeholder signal; a purpose-trained
/// forgery detector only has to implement this trait to replace it.
pub trait LearnedSignalProvider: Send + Sync {
    fn name(&self) -> &str;
    fn synthetic_likelihood(&self, image: &RgbImage) -> Result<f32, AnalyzerError>;
}

/// Stands in when no model is configured. Every call fails, so the GAN
/// sector degrades to its neutral score.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProvider;

impl LearnedSignalProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn synthetic_likelihood(&self, _image: &RgbImage) -> Result<f32, AnalyzerError> {
        Err(AnalyzerError::ModelUnavailable)
    }
}

/// Numerically stable softmax. Falls back to uniform when the exponent sum degenerates.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return vec![];
    }
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    let mut exps = Vec::with_capacity(logits.len());
    for &l in logits {
        let e = (l - max_logit).exp();
        sum += e;
        exps.push(e);
    }
    if sum <= 0.0 || !sum.is_finite() {
        let n = logits.len() as f32;
        return vec![1.0 / n; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// `1 - p(class 0)`: the classifier's confidence in its first class, inverted.
pub fn inverted_first_class(logits: &[f32]) -> Result<f32, AnalyzerError> {
    let probabilities = softmax(logits);
    let first = probabilities
        .first()
        .ok_or_else(|| AnalyzerError::Inference("model produced no logits".to_string()))?;
    Ok(1.0 - first)
}

/// Square resize plus HWC u8 -> CHW f32 in [0, 1], batch of one.
pub fn to_chw_tensor(image: &RgbImage, size: u32) -> Vec<f32> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        for channel in 0..3 {
            data[channel * plane + i] = pixel.0[channel] as f32 / 255.0;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(probabilities[2] > probabilities[1]);
    }

    #[test]
    fn softmax_survives_huge_logits() {
        let probabilities = softmax(&[1000.0, 1000.0]);
        assert!((probabilities[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn equal_logits_give_uniform_score() {
        let score = inverted_first_class(&[0.0; 4]).unwrap();
        assert!((score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn dominant_first_class_scores_near_zero() {
        let score = inverted_first_class(&[50.0, 0.0, 0.0]).unwrap();
        assert!(score < 1e-6);
    }

    #[test]
    fn empty_logits_are_an_error() {
        assert!(inverted_first_class(&[]).is_err());
    }

    #[test]
    fn tensor_is_planar_and_normalized() {
        let image = RgbImage::from_pixel(10, 6, Rgb([255, 0, 51]));
        let tensor = to_chw_tensor(&image, 4);
        assert_eq!(tensor.len(), 3 * 16);
        assert!(tensor[..16].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(tensor[16..32].iter().all(|&v| v == 0.0));
        assert!(tensor[32..].iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn unavailable_provider_always_fails() {
        let image = RgbImage::new(2, 2);
        assert!(matches!(
            UnavailableProvider.synthetic_likelihood(&image),
            Err(AnalyzerError::ModelUnavailable)
        ));
    }
}
