pub mod upload;

pub use upload::{ImageLoader, LoadedImage};
