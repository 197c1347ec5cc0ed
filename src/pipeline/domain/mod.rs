pub mod ensemble;
pub mod sector;

pub use ensemble::{EnsembleResult, Label};
pub use sector::{AnalyzerResult, Finding, Sector};
