//! CompositeFrame - aggregator output
//!
//! One display artifact per tick: the last known frame plus one overlay
//! text line per counter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FrameData, SensorId};

/// Overlay text anchor of the first line (pixels)
pub const OVERLAY_ORIGIN: (i32, i32) = (10, 30);

/// Vertical distance between overlay lines (pixels)
pub const OVERLAY_LINE_SPACING: i32 = 40;

/// Composed display artifact
#[derive(Debug, Clone)]
pub struct CompositeFrame {
    /// Tick sequence number (monotonically increasing)
    pub tick: u64,

    /// Clock time at composition
    pub composed_at: Duration,

    /// Last known frame (`None` until the first frame arrives)
    pub frame: Option<FrameData>,

    /// Overlay lines, one per counter source, in configuration order
    pub overlay: Vec<OverlayLine>,

    /// Freshness bookkeeping
    pub meta: CompositeMeta,
}

impl CompositeFrame {
    /// Overlay line for a source
    pub fn line(&self, sensor_id: &str) -> Option<&OverlayLine> {
        self.overlay.iter().find(|line| line.sensor_id == sensor_id)
    }

    /// Displayed value for a counter source
    pub fn value_of(&self, sensor_id: &str) -> Option<u64> {
        self.line(sensor_id).and_then(|line| line.value)
    }
}

/// One overlay text line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLine {
    pub sensor_id: SensorId,

    /// Rendered text, e.g. `"sensor0: 42"`
    pub text: String,

    /// Text anchor (x, y) in pixels
    pub origin: (i32, i32),

    /// Displayed value (`None` before the first sample)
    pub value: Option<u64>,

    /// Whether `value` is an estimate rather than a real sample
    pub extrapolated: bool,
}

impl OverlayLine {
    /// Anchor for the `index`-th line
    pub fn origin_for(index: usize) -> (i32, i32) {
        (
            OVERLAY_ORIGIN.0,
            OVERLAY_ORIGIN.1 + OVERLAY_LINE_SPACING * index as i32,
        )
    }
}

/// Per-tick freshness metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeMeta {
    /// Sources that delivered a new sample this tick
    pub fresh_sources: Vec<SensorId>,

    /// Sources shown from their last known value
    pub stale_sources: Vec<SensorId>,

    /// Subset of stale sources whose value was extrapolated
    pub extrapolated_sources: Vec<SensorId>,

    /// Age of the displayed frame's capture time
    pub frame_age: Option<Duration>,
}
