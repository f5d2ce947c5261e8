//! Channel metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-channel counters
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Samples written by the sampler
    pub put: AtomicU64,

    /// Samples replaced before the aggregator read them
    pub overwritten: AtomicU64,

    /// Samples read by the aggregator
    pub taken: AtomicU64,
}

impl ChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_put(&self, overwrote: bool) {
        self.put.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_taken(&self) {
        self.taken.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ChannelMetricsSnapshot {
        ChannelMetricsSnapshot {
            put: self.put.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelMetricsSnapshot {
    pub put: u64,
    pub overwritten: u64,
    pub taken: u64,
}

impl ChannelMetricsSnapshot {
    /// Samples still sitting in the slot (0 or 1)
    pub fn pending(&self) -> u64 {
        self.put
            .saturating_sub(self.overwritten.saturating_add(self.taken))
    }
}
