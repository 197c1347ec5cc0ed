pub mod analyzer_service;
pub mod fail_soft;

pub use analyzer_service::AnalyzerService;
pub use fail_soft::{FailSoft, FailSoftLayer};
