use crate::error::AppError;
use crate::pipeline::domain::EnsembleResult;
use serde_json::{json, Value};

/// Status code plus JSON body, ready for whichever transport sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub status: u16,
    pub body: Value,
}

impl AnalysisResponse {
    pub fn from_result(result: Result<EnsembleResult, AppError>) -> Self {
        match result {
            Ok(verdict) => Self::success(&verdict),
            Err(e) => Self::error(&e),
        }
    }

    pub fn success(verdict: &EnsembleResult) -> Self {
        match serde_json::to_value(verdict) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&AppError::Pipeline(format!("failed to serialize verdict: {e}"))),
        }
    }

    pub fn error(error: &AppError) -> Self {
        Self {
            status: error.status_code(),
            body: json!({ "error": error.to_string() }),
        }
    }

    pub fn health() -> Self {
        Self {
            status: 200,
            body: json!({ "status": "ok", "message": "Image forensics backend running" }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
