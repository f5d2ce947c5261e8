//! Per-source "last known" record
//!
//! Owned and mutated by the aggregator only.

use std::time::Duration;

use contracts::{FrameData, Sample, SamplePayload};

/// Most recent real sample of one source
#[derive(Debug, Clone, Default)]
pub struct LastKnown {
    sample: Option<Sample>,
    nominal_period: Option<Duration>,
}

impl LastKnown {
    pub fn new(nominal_period: Option<Duration>) -> Self {
        Self {
            sample: None,
            nominal_period,
        }
    }

    /// Record a sample. Returns `false` (and keeps the current record) if
    /// the sample is not newer than what is already known.
    pub fn observe(&mut self, sample: Sample) -> bool {
        if let Some(current) = &self.sample {
            if sample.sequence <= current.sequence {
                return false;
            }
        }
        self.sample = Some(sample);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.sample.is_none()
    }

    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_ref()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sample.as_ref().map(|s| s.sequence)
    }

    /// Capture time of the last real sample
    pub fn observed_at(&self) -> Option<Duration> {
        self.sample.as_ref().map(|s| s.timestamp)
    }

    pub fn nominal_period(&self) -> Option<Duration> {
        self.nominal_period
    }

    /// Time since the last real sample
    pub fn age(&self, now: Duration) -> Option<Duration> {
        self.observed_at().map(|t| now.saturating_sub(t))
    }

    pub fn counter_value(&self) -> Option<u64> {
        self.sample.as_ref().and_then(Sample::counter_value)
    }

    pub fn frame(&self) -> Option<&FrameData> {
        match self.sample.as_ref().map(|s| &s.payload) {
            Some(SamplePayload::Frame(frame)) => Some(frame),
            _ => None,
        }
    }
}
