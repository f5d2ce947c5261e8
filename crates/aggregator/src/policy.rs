//! Staleness policies
//!
//! What to show for a source that delivered nothing since the last tick.

use std::time::Duration;

use contracts::SensorKind;
use serde::{Deserialize, Serialize};

use crate::last_known::LastKnown;

/// Policy for a source with no fresh sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalenessPolicy {
    /// Show the last known value unchanged
    Hold,
    /// Predict the counter from its nominal period:
    /// `V + floor((now - observed_at) / P)`
    Extrapolate { period: Duration },
}

/// Displayed counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub value: u64,
    /// `value` differs from the last real sample
    pub extrapolated: bool,
}

impl StalenessPolicy {
    /// Pick the policy for a source.
    ///
    /// Frames are always held; counters are extrapolated when enabled and
    /// a non-zero nominal period is known.
    pub fn for_source(kind: SensorKind, nominal_period: Option<Duration>, extrapolate: bool) -> Self {
        match (kind, nominal_period) {
            (SensorKind::Counter, Some(period)) if extrapolate && !period.is_zero() => {
                Self::Extrapolate { period }
            }
            _ => Self::Hold,
        }
    }

    /// Counter value to display at `now`, or `None` before the first sample
    pub fn estimate(&self, last: &LastKnown, now: Duration) -> Option<Estimate> {
        let value = last.counter_value()?;
        match *self {
            Self::Hold => Some(Estimate {
                value,
                extrapolated: false,
            }),
            Self::Extrapolate { period } => {
                let elapsed = last.age(now).unwrap_or_default();
                let steps = periods_elapsed(elapsed, period);
                Some(Estimate {
                    value: value.saturating_add(steps),
                    extrapolated: steps > 0,
                })
            }
        }
    }
}

/// `floor(elapsed / period)` in integer nanoseconds
fn periods_elapsed(elapsed: Duration, period: Duration) -> u64 {
    let period = period.as_nanos();
    if period == 0 {
        return 0;
    }
    u64::try_from(elapsed.as_nanos() / period).unwrap_or(u64::MAX)
}
