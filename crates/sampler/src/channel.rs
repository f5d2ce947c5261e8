//! LatestChannel - single-slot, overwrite-on-full handoff
//!
//! One sampler writes, the aggregator reads. `put` replaces any unread
//! sample (newest wins) and `try_take` empties the slot; neither ever waits
//! on the other side beyond the slot's short critical section.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{Sample, SensorId};
use parking_lot::Mutex;
use tracing::trace;

use crate::stats::{ChannelMetrics, ChannelMetricsSnapshot};

#[derive(Debug)]
struct Shared {
    sensor_id: SensorId,
    slot: Mutex<Option<Sample>>,
    metrics: ChannelMetrics,
    /// Set when the sender is dropped
    closed: AtomicBool,
}

/// Create a channel for one source
pub fn latest_channel(sensor_id: impl Into<SensorId>) -> (LatestSender, LatestReceiver) {
    let shared = Arc::new(Shared {
        sensor_id: sensor_id.into(),
        slot: Mutex::new(None),
        metrics: ChannelMetrics::new(),
        closed: AtomicBool::new(false),
    });

    (
        LatestSender {
            shared: shared.clone(),
        },
        LatestReceiver { shared },
    )
}

/// Writing half (owned by the sampler)
#[derive(Debug)]
pub struct LatestSender {
    shared: Arc<Shared>,
}

impl LatestSender {
    /// Store `sample`, returning the unread sample it replaced, if any
    pub fn put(&self, sample: Sample) -> Option<Sample> {
        let replaced = {
            let mut slot = self.shared.slot.lock();
            let replaced = slot.replace(sample);
            self.shared.metrics.record_put(replaced.is_some());
            replaced
        };

        if let Some(old) = &replaced {
            trace!(
                sensor_id = %self.shared.sensor_id,
                sequence = old.sequence,
                "unread sample overwritten"
            );
        }
        replaced
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.shared.sensor_id
    }
}

impl Drop for LatestSender {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}

/// Reading half (owned by the aggregator)
#[derive(Debug)]
pub struct LatestReceiver {
    shared: Arc<Shared>,
}

impl LatestReceiver {
    /// Take the pending sample, leaving the slot empty
    pub fn try_take(&self) -> Option<Sample> {
        let mut slot = self.shared.slot.lock();
        let sample = slot.take();
        if sample.is_some() {
            self.shared.metrics.record_taken();
        }
        sample
    }

    /// Whether a sample is waiting
    pub fn has_pending(&self) -> bool {
        self.shared.slot.lock().is_some()
    }

    /// The sender is gone; no sample will ever arrive after the pending one
    pub fn is_disconnected(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.shared.sensor_id
    }

    pub fn metrics(&self) -> ChannelMetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}
