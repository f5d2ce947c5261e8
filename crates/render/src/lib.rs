//! # Render
//!
//! Display collaborators for composed frames.
//!
//! Responsibilities:
//! - Log composite summaries
//! - Persist frames (PNG) and overlays (JSON) to disk
//! - Fan one composite out to every configured renderer
//! - Carry the external quit request into the tick loop

mod error;
mod factory;
mod quit;
pub mod renderers;
mod set;

pub use contracts::Renderer;
pub use error::RenderError;
pub use factory::create_renderers;
pub use quit::QuitSignal;
pub use renderers::{FileRenderer, FileRendererConfig, LogRenderer};
pub use set::{RendererCounts, RendererSet};
