pub mod core;
pub mod ela;
pub mod gan;
pub mod metadata;
pub mod noise;
pub mod visual;

pub use self::core::ForensicAnalyzer;
pub use ela::ElaAnalyzer;
pub use gan::GanDetectionAnalyzer;
pub use metadata::MetadataAnalyzer;
pub use noise::NoiseResidualAnalyzer;
pub use visual::VisualConsistencyAnalyzer;
