//! Renderer implementations

mod file;
mod log;

pub use self::file::{FileRenderer, FileRendererConfig};
pub use self::log::LogRenderer;
