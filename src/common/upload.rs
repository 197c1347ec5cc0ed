use crate::error::AppError;
use image::{ImageFormat, RgbImage};
use std::sync::Arc;
use uuid::Uuid;

/// A decoded upload. Pixels are canonical RGB8; the original bytes stay
/// alongside so embedded metadata can still be read after decoding.
#[derive(Clone)]
pub struct LoadedImage {
    request_id: Uuid,
    rgb: Arc<RgbImage>,
    format: Option<ImageFormat>,
    raw: Arc<[u8]>,
}

impl LoadedImage {
    pub fn new(request_id: Uuid, rgb: RgbImage, format: Option<ImageFormat>, raw: Vec<u8>) -> Self {
        Self {
            request_id,
            rgb: Arc::new(rgb),
            format,
            raw: Arc::from(raw),
        }
    }

    /// Wraps already-decoded pixels with no container bytes behind them.
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self::new(Uuid::new_v4(), rgb, None, Vec::new())
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl ImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decodes any format the `image` crate recognizes into RGB8.
    pub fn load(&self, request_id: Uuid, bytes: Vec<u8>) -> Result<LoadedImage, AppError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let rgb = decoded.to_rgb8();
        tracing::debug!(
            %request_id,
            ?format,
            width = rgb.width(),
            height = rgb.height(),
            "Decoded upload"
        );
        Ok(LoadedImage::new(request_id, rgb, Some(format), bytes))
    }
}
