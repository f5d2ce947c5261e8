//! Clock - the single monotonic time source
//!
//! Sampler cadence, sample timestamps and extrapolation all read the same
//! clock so their arithmetic never mixes time bases.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::StopSignal;

/// Monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since the clock epoch
    fn now(&self) -> Duration;

    /// Block until `deadline` or until `stop` fires.
    ///
    /// Returns `false` when interrupted by the stop signal.
    fn sleep_until(&self, deadline: Duration, stop: &StopSignal) -> bool;
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock-independent clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&self, deadline: Duration, stop: &StopSignal) -> bool {
        loop {
            if stop.is_triggered() {
                return false;
            }
            let now = self.now();
            if now >= deadline {
                return true;
            }
            if stop.wait_timeout(deadline - now) {
                return false;
            }
        }
    }
}

/// Manually driven clock for deterministic tests.
///
/// `sleep_until` does not block; it jumps the clock forward to the deadline.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        self.nanos.store(t.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep_until(&self, deadline: Duration, stop: &StopSignal) -> bool {
        if stop.is_triggered() {
            return false;
        }
        self.nanos
            .fetch_max(deadline.as_nanos() as u64, Ordering::SeqCst);
        true
    }
}

/// What a [`PeriodicTimer`] does after falling more than a period behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissedTickBehavior {
    /// Fire back-to-back until caught up (counters keep one increment per period)
    Burst,
    /// Drop the missed instants and resume on the next future one (display ticks)
    Skip,
}

/// Periodic timer with drift correction.
///
/// Tracks an absolute next-fire instant instead of sleeping a relative
/// duration, so scheduling jitter does not accumulate.
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period: Duration,
    next_fire: Duration,
    behavior: MissedTickBehavior,
}

impl PeriodicTimer {
    /// First fire is one `period` after `start`.
    pub fn new(period: Duration, start: Duration, behavior: MissedTickBehavior) -> Self {
        Self {
            period,
            next_fire: start + period,
            behavior,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn next_fire(&self) -> Duration {
        self.next_fire
    }

    /// Wait for the next fire instant.
    ///
    /// Returns `Some(skipped)` with the number of instants dropped under
    /// [`MissedTickBehavior::Skip`], or `None` if the stop signal fired.
    pub fn wait(&mut self, clock: &dyn Clock, stop: &StopSignal) -> Option<u64> {
        if !clock.sleep_until(self.next_fire, stop) {
            return None;
        }
        Some(self.advance(clock.now()))
    }

    /// Move the schedule past a fire that happened at `now`
    fn advance(&mut self, now: Duration) -> u64 {
        self.next_fire += self.period;
        if self.behavior == MissedTickBehavior::Burst || self.period.is_zero() {
            return 0;
        }

        let mut skipped = 0;
        while self.next_fire <= now {
            self.next_fire += self.period;
            skipped += 1;
        }
        skipped
    }
}
