pub mod onnx_classifier;
pub mod provider;

pub use onnx_classifier::OnnxClassifier;
pub use provider::{LearnedSignalProvider, UnavailableProvider};
