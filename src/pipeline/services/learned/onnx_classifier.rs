//! Generic pretrained image classifier loaded through ONNX Runtime.
//!
//! This is a placeholder learned signal: the model is not trained for
//! forgery detection, and its class-0 confidence has no validated meaning.

use super::provider::{inverted_first_class, to_chw_tensor, LearnedSignalProvider};
use crate::error::{AnalyzerError, AppError};
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct OnnxClassifier {
    /// `Session::run` takes `&mut self`; one session per concurrent inference slot.
    sessions: Vec<Mutex<Session>>,
    next: AtomicUsize,
    input_size: u32,
    model_name: String,
}

impl OnnxClassifier {
    /// Loads `sessions` copies of the model once; callers share the result for the
    /// process lifetime. Size it to the inference concurrency limit.
    ///
    /// # Errors
    /// Returns `AppError::ModelLoad` if the file is missing or the runtime rejects it.
    pub fn load(
        model_path: &Path,
        input_size: u32,
        intra_threads: usize,
        sessions: usize,
    ) -> Result<Self, AppError> {
        let load_error = |reason: String| AppError::ModelLoad {
            path: model_path.display().to_string(),
            reason,
        };

        if !model_path.exists() {
            return Err(load_error("model file not found".to_string()));
        }

        let sessions = (0..sessions.max(1))
            .map(|_| {
                let session = Session::builder()
                    .map_err(|e| load_error(e.to_string()))?
                    .with_intra_threads(intra_threads)
                    .map_err(|e| load_error(e.to_string()))?
                    .commit_from_file(model_path)
                    .map_err(|e| load_error(e.to_string()))?;
                Ok(Mutex::new(session))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let model_name = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-model")
            .to_string();

        debug!(model = %model_name, input_size, sessions = sessions.len(), "ONNX classifier loaded");

        Ok(Self {
            sessions,
            next: AtomicUsize::new(0),
            input_size,
            model_name,
        })
    }

    // Prefers an idle session; falls back to waiting on one in rotation.
    fn checkout(&self) -> Result<MutexGuard<'_, Session>, AnalyzerError> {
        if let Some(idle) = self.sessions.iter().find_map(|s| s.try_lock().ok()) {
            return Ok(idle);
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        self.sessions[index]
            .lock()
            .map_err(|e| AnalyzerError::Inference(format!("session lock poisoned: {e}")))
    }

    fn logits(&self, image: &RgbImage) -> Result<Vec<f32>, AnalyzerError> {
        let side = self.input_size as i64;
        let input = to_chw_tensor(image, self.input_size);
        let tensor = Tensor::from_array((vec![1i64, 3, side, side], input))
            .map_err(|e| AnalyzerError::Inference(format!("tensor creation error: {e}")))?;

        let mut session = self.checkout()?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| AnalyzerError::Inference(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| AnalyzerError::Inference("no output tensor".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalyzerError::Inference(format!("tensor extraction failed: {e}")))?;

        // [batch=1, classes]
        if shape.len() != 2 || shape[0] != 1 {
            return Err(AnalyzerError::Inference(format!(
                "unexpected output shape: {shape:?}"
            )));
        }
        Ok(data[..shape[1] as usize].to_vec())
    }
}

impl LearnedSignalProvider for OnnxClassifier {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn synthetic_likelihood(&self, image: &RgbImage) -> Result<f32, AnalyzerError> {
        let logits = self.logits(image)?;
        inverted_first_class(&logits)
    }
}
