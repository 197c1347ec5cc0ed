pub mod domain;
pub mod orchestration;
pub mod services;

pub use domain::{AnalyzerResult, EnsembleResult, Label, Sector};
pub use orchestration::{ForensicService, ForensicServiceBuilder};
