//! Run statistics

use std::collections::BTreeMap;
use std::fmt;

use contracts::SensorId;
use serde::Serialize;

/// Per-source counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    /// Real samples taken from the channel
    pub samples_taken: u64,
    /// Ticks where the source had nothing new
    pub stale_ticks: u64,
    /// Ticks where the displayed value was extrapolated
    pub extrapolated_ticks: u64,
    /// Last displayed counter value
    pub last_value: Option<u64>,
    /// Sampler channel closed (source permanently silent)
    pub disconnected: bool,
}

/// Aggregator run summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Composite frames produced
    pub ticks: u64,
    /// Composites that carried an image
    pub frames_composed: u64,
    /// Tick instants dropped because the loop fell behind
    pub skipped_ticks: u64,
    /// Renderer failures
    pub render_errors: u64,
    pub sources: BTreeMap<SensorId, SourceStats>,
}

impl RunStats {
    pub fn source_mut(&mut self, sensor_id: &SensorId) -> &mut SourceStats {
        self.sources.entry(sensor_id.clone()).or_default()
    }

    pub fn source(&self, sensor_id: &str) -> Option<&SourceStats> {
        self.sources.get(sensor_id)
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ticks={} frames={} skipped={} render_errors={}",
            self.ticks, self.frames_composed, self.skipped_ticks, self.render_errors
        )?;
        for (id, s) in &self.sources {
            write!(
                f,
                "  {id}: samples={} stale={} extrapolated={}",
                s.samples_taken, s.stale_ticks, s.extrapolated_ticks
            )?;
            if let Some(v) = s.last_value {
                write!(f, " last={v}")?;
            }
            if s.disconnected {
                f.write_str(" (disconnected)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
