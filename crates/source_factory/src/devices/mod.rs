//! Capture device implementations

mod image_sequence;
mod synthetic;

pub use image_sequence::ImageSequenceCamera;
pub use synthetic::SyntheticCamera;
