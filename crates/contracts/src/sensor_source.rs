//! SensorSource trait - polymorphic sample producer
//!
//! Variants live in `source_factory`: a periodic counter and a frame source
//! backed by a [`CaptureDevice`](crate::CaptureDevice). The aggregator only
//! sees the [`SensorKind`] tag and the nominal period.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{Clock, SamplePayload, SensorId, SensorKind, SourceError, StopSignal};

/// Everything a source may need while producing one reading
#[derive(Clone, Copy)]
pub struct SampleContext<'a> {
    pub clock: &'a dyn Clock,
    pub stop: &'a StopSignal,
}

impl<'a> SampleContext<'a> {
    pub fn new(clock: &'a dyn Clock, stop: &'a StopSignal) -> Self {
        Self { clock, stop }
    }
}

/// Sample producer driven by exactly one sampler thread.
///
/// # Example
///
/// ```ignore
/// let ctx = SampleContext::new(&clock, &stop);
/// match source.get(&ctx) {
///     Ok(Some(payload)) => channel.put(stamp(payload)),
///     Ok(None) => {}                       // nothing this cadence
///     Err(e) if e.is_transient() => warn!(%e),
///     Err(e) => return,                    // sampler-terminal
/// }
/// ```
pub trait SensorSource: Send {
    fn sensor_id(&self) -> &SensorId;

    fn kind(&self) -> SensorKind;

    /// Fixed nominal interval between readings, if the source has one
    fn nominal_period(&self) -> Option<Duration>;

    /// Produce the next reading, waiting out the source's own cadence.
    ///
    /// Returns `Ok(None)` when no value was produced (a dropped frame, or the
    /// wait was cut short by the stop signal).
    fn get(&mut self, ctx: &SampleContext<'_>) -> Result<Option<SamplePayload>, SourceError>;

    /// Handle for releasing this source's resources from outside its
    /// sampler thread (sources without resources return `None`)
    fn resource_guard(&self) -> Option<Arc<dyn ResourceGuard>> {
        None
    }
}

/// Release-once handle over a resource owned by a source.
///
/// Both the owning source (on drop) and the shutdown coordinator (after a
/// join timeout) may ask for release; the resource is released at most once.
pub trait ResourceGuard: Send + Sync + fmt::Debug {
    /// Try to release within `wait`.
    ///
    /// Returns `true` if the resource is released (now or earlier), `false`
    /// if it is still held by a blocked reader.
    fn try_release(&self, wait: Duration) -> bool;

    fn is_released(&self) -> bool;
}
