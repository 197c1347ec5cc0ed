pub mod common;
pub mod config;
pub mod error;
pub mod intake;
pub mod pipeline;

pub use error::{AnalyzerError, AppError};

pub use config::Configuration;
pub use intake::{AnalysisRequest, AnalysisResponse};
pub use pipeline::{EnsembleResult, ForensicService, ForensicServiceBuilder, Label, Sector};
