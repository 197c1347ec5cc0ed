pub mod request;
pub mod response;

pub use request::AnalysisRequest;
pub use response::AnalysisResponse;
