pub mod forensic_service;
pub mod service;

pub use forensic_service::{ForensicService, ForensicServiceBuilder, SectorService};
