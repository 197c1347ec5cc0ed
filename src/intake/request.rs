use crate::error::AppError;
use uuid::Uuid;

/// One upload handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    request_id: Uuid,
    image: Vec<u8>,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            image,
        }
    }

    /// Builds a request from the `image` form field, if the client sent one.
    pub fn from_form_field(field: Option<Vec<u8>>) -> Result<Self, AppError> {
        field.map(Self::new).ok_or(AppError::MissingImage)
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn into_parts(self) -> (Uuid, Vec<u8>) {
        (self.request_id, self.image)
    }
}
