pub mod analysis;
pub mod learned;
