//! RendererSet - fan-out of one composite to every configured renderer
//!
//! A failing member is logged and counted; the others still render.

use contracts::{CompositeFrame, ContractError, Renderer};
use tracing::{debug, error, warn};

use crate::quit::QuitSignal;

/// Per-renderer outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererCounts {
    pub rendered: u64,
    pub failed: u64,
}

struct Member {
    renderer: Box<dyn Renderer>,
    counts: RendererCounts,
}

/// Composite renderer over several members plus an external quit flag
pub struct RendererSet {
    members: Vec<Member>,
    quit: QuitSignal,
}

impl RendererSet {
    pub fn new(quit: QuitSignal) -> Self {
        Self {
            members: Vec::new(),
            quit,
        }
    }

    /// Add a member renderer
    pub fn push(&mut self, renderer: Box<dyn Renderer>) {
        self.members.push(Member {
            renderer,
            counts: RendererCounts::default(),
        });
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn quit_signal(&self) -> &QuitSignal {
        &self.quit
    }

    /// Member names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.renderer.name()).collect()
    }

    /// Counters per member, in insertion order
    pub fn counts(&self) -> Vec<(String, RendererCounts)> {
        self.members
            .iter()
            .map(|m| (m.renderer.name().to_string(), m.counts))
            .collect()
    }
}

impl Renderer for RendererSet {
    fn name(&self) -> &str {
        "renderer_set"
    }

    /// Render to every member; returns the first failure after all ran
    fn render(&mut self, frame: &CompositeFrame) -> Result<(), ContractError> {
        let mut first_error = None;

        for member in &mut self.members {
            match member.renderer.render(frame) {
                Ok(()) => member.counts.rendered += 1,
                Err(e) => {
                    member.counts.failed += 1;
                    metrics::counter!(
                        "sensor_display_render_failures_total",
                        "renderer" => member.renderer.name().to_string()
                    )
                    .increment(1);
                    warn!(
                        renderer = member.renderer.name(),
                        tick = frame.tick,
                        error = %e,
                        "renderer failed, continuing with others"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit.is_requested() || self.members.iter().any(|m| m.renderer.quit_requested())
    }

    fn close(&mut self) -> Result<(), ContractError> {
        let mut first_error = None;

        for member in &mut self.members {
            if let Err(e) = member.renderer.close() {
                error!(renderer = member.renderer.name(), error = %e, "renderer close failed");
                first_error.get_or_insert(e);
            } else {
                debug!(
                    renderer = member.renderer.name(),
                    rendered = member.counts.rendered,
                    failed = member.counts.failed,
                    "renderer closed"
                );
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
