//! QuitSignal - external "please stop" request polled by renderers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable quit flag.
///
/// Set from outside the tick loop (Ctrl+C handler, tick budget); the
/// aggregator sees it through [`Renderer::quit_requested`](contracts::Renderer::quit_requested).
#[derive(Debug, Clone, Default)]
pub struct QuitSignal {
    requested: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request quit. Returns `true` for the first request only.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
