//! Periodic counter source
//!
//! Waits out one nominal period, then returns the next integer (1, 2, 3...).
//! The wait runs on an absolute schedule, so the n-th value is due at
//! `start + n * period` regardless of how long each call took.

use std::time::Duration;

use contracts::{
    MissedTickBehavior, PeriodicTimer, SampleContext, SamplePayload, SensorId, SensorKind,
    SensorSource, SourceError,
};
use tracing::trace;

/// Incrementing integer at a fixed nominal period
#[derive(Debug)]
pub struct PeriodicCounter {
    sensor_id: SensorId,
    period: Duration,
    value: u64,
    /// Armed on the first `get`
    timer: Option<PeriodicTimer>,
}

impl PeriodicCounter {
    pub fn new(sensor_id: impl Into<SensorId>, period: Duration) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            period,
            value: 0,
            timer: None,
        }
    }

    /// Last value returned
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl SensorSource for PeriodicCounter {
    fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Counter
    }

    fn nominal_period(&self) -> Option<Duration> {
        Some(self.period)
    }

    fn get(&mut self, ctx: &SampleContext<'_>) -> Result<Option<SamplePayload>, SourceError> {
        let timer = self.timer.get_or_insert_with(|| {
            PeriodicTimer::new(self.period, ctx.clock.now(), MissedTickBehavior::Burst)
        });

        if timer.wait(ctx.clock, ctx.stop).is_none() {
            return Ok(None);
        }

        self.value = self
            .value
            .checked_add(1)
            .ok_or_else(|| SourceError::terminal(&self.sensor_id, "counter overflow"))?;

        trace!(sensor_id = %self.sensor_id, value = self.value, "counter tick");
        Ok(Some(SamplePayload::Counter(self.value)))
    }
}
