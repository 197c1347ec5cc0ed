use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unable to open image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("No image file provided")]
    MissingImage,
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl AppError {
    /// HTTP-equivalent status class for the transport collaborator.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Decode(_) | AppError::MissingImage => 400,
            _ => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

// Analyzer internal faults. These never leave the fail-soft layer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("{0}")]
    Metadata(#[from] exif::Error),
    #[error("re-encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("re-saved image is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("image has no pixels")]
    EmptyImage,
    #[error("no learned model configured")]
    ModelUnavailable,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("score is not a finite number")]
    NonFiniteScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_missing_image_are_client_errors() {
        assert_eq!(AppError::MissingImage.status_code(), 400);
        let decode = image::load_from_memory(b"definitely not an image").unwrap_err();
        assert!(AppError::from(decode).is_client_error());
        assert!(!AppError::Pipeline("boom".to_string()).is_client_error());
    }

    #[test]
    fn decode_error_message_names_the_failure() {
        let decode = image::load_from_memory(b"plain text").unwrap_err();
        let message = AppError::from(decode).to_string();
        assert!(message.starts_with("Unable to open image: "));
    }
}
