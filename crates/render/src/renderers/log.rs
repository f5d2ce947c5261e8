//! LogRenderer - logs composite summaries via tracing

use contracts::{CompositeFrame, ContractError, Renderer};
use tracing::{debug, info, trace};

/// Renderer that logs one summary line per composite
pub struct LogRenderer {
    name: String,
    rendered: u64,
}

impl LogRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rendered: 0,
        }
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    fn log_summary(&self, frame: &CompositeFrame) {
        let overlay = frame
            .overlay
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        debug!(
            renderer = %self.name,
            tick = frame.tick,
            composed_at_ms = frame.composed_at.as_millis() as u64,
            has_frame = frame.frame.is_some(),
            frame_age_ms = frame.meta.frame_age.map(|a| a.as_millis() as u64),
            overlay = %overlay,
            "composite"
        );

        for line in &frame.overlay {
            trace!(
                renderer = %self.name,
                sensor_id = %line.sensor_id,
                value = line.value,
                extrapolated = line.extrapolated,
                x = line.origin.0,
                y = line.origin.1,
                "overlay line"
            );
        }
    }
}

impl Renderer for LogRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, frame: &CompositeFrame) -> Result<(), ContractError> {
        self.log_summary(frame);
        self.rendered += 1;
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        false
    }

    fn close(&mut self) -> Result<(), ContractError> {
        info!(renderer = %self.name, rendered = self.rendered, "LogRenderer closed");
        Ok(())
    }
}
