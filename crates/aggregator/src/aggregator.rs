//! Aggregator - latest-value compositor
//!
//! Each tick:
//! 1. drain at most one pending sample per source (`try_take`, never blocks)
//! 2. update that source's [`LastKnown`]
//! 3. compose the last known frame plus one overlay line per counter
//!
//! Displayed counter values never decrease: an extrapolated estimate can
//! run ahead of a lagging sampler, so the shown value is clamped to the
//! highest value shown before.

use std::time::Duration;

use contracts::{CompositeFrame, CompositeMeta, OverlayLine, SensorId, SensorKind};
use metrics::{counter, gauge};
use sampler::{LatestReceiver, SourceFeed};
use tracing::{debug, instrument, warn};

use crate::last_known::LastKnown;
use crate::policy::StalenessPolicy;
use crate::stats::RunStats;

/// Aggregator settings
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// Extrapolate counters that have a nominal period
    pub extrapolate: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { extrapolate: true }
    }
}

#[derive(Debug)]
struct SourceState {
    sensor_id: SensorId,
    kind: SensorKind,
    receiver: LatestReceiver,
    last: LastKnown,
    policy: StalenessPolicy,
    /// Highest counter value displayed so far
    displayed: Option<u64>,
    disconnected: bool,
}

/// Single-consumer compositor over all source feeds
#[derive(Debug)]
pub struct Aggregator {
    sources: Vec<SourceState>,
    tick: u64,
    stats: RunStats,
}

impl Aggregator {
    /// Feeds keep their order; counters are laid out in that order.
    pub fn new(feeds: Vec<SourceFeed>, config: AggregatorConfig) -> Self {
        let mut stats = RunStats::default();
        let sources = feeds
            .into_iter()
            .map(|feed| {
                stats.source_mut(&feed.sensor_id);
                SourceState {
                    policy: StalenessPolicy::for_source(
                        feed.kind,
                        feed.nominal_period,
                        config.extrapolate,
                    ),
                    last: LastKnown::new(feed.nominal_period),
                    sensor_id: feed.sensor_id,
                    kind: feed.kind,
                    receiver: feed.receiver,
                    displayed: None,
                    disconnected: false,
                }
            })
            .collect();

        Self {
            sources,
            tick: 0,
            stats,
        }
    }

    /// Produce the composite for clock time `now`
    #[instrument(name = "aggregator_tick", skip(self), fields(tick = self.tick + 1), level = "trace")]
    pub fn tick(&mut self, now: Duration) -> CompositeFrame {
        self.tick += 1;
        let mut meta = CompositeMeta::default();
        let mut overlay = Vec::new();
        let mut frame = None;

        for state in &mut self.sources {
            let stats = self.stats.sources.entry(state.sensor_id.clone()).or_default();

            let fresh = match state.receiver.try_take() {
                Some(sample) => state.last.observe(sample),
                None => false,
            };
            if fresh {
                stats.samples_taken += 1;
                meta.fresh_sources.push(state.sensor_id.clone());
            } else if !state.last.is_empty() {
                stats.stale_ticks += 1;
                meta.stale_sources.push(state.sensor_id.clone());
            }

            if !state.disconnected && state.receiver.is_disconnected() {
                state.disconnected = true;
                stats.disconnected = true;
                warn!(
                    sensor_id = %state.sensor_id,
                    "sampler gone, holding last known value"
                );
            }

            if let Some(age) = state.last.age(now) {
                gauge!("sensor_display_source_age_seconds", "sensor_id" => state.sensor_id.to_string())
                    .set(age.as_secs_f64());
            }

            match state.kind {
                SensorKind::Camera => {
                    if frame.is_none() {
                        if let Some(data) = state.last.frame() {
                            frame = Some(data.clone());
                            meta.frame_age = state.last.age(now);
                        }
                    }
                }
                SensorKind::Counter => {
                    let estimate = state.policy.estimate(&state.last, now);
                    let mut value = estimate.map(|e| e.value);
                    let mut extrapolated = estimate.is_some_and(|e| e.extrapolated);

                    if let (Some(v), Some(shown)) = (value, state.displayed) {
                        if v < shown {
                            value = Some(shown);
                            extrapolated = true;
                        }
                    }
                    state.displayed = value.or(state.displayed);

                    if extrapolated {
                        stats.extrapolated_ticks += 1;
                        meta.extrapolated_sources.push(state.sensor_id.clone());
                        counter!(
                            "sensor_display_extrapolated_total",
                            "sensor_id" => state.sensor_id.to_string()
                        )
                        .increment(1);
                    }
                    stats.last_value = value;

                    let index = overlay.len();
                    overlay.push(OverlayLine {
                        sensor_id: state.sensor_id.clone(),
                        text: format!("{}: {}", state.sensor_id, value.unwrap_or(0)),
                        origin: OverlayLine::origin_for(index),
                        value,
                        extrapolated,
                    });
                }
            }
        }

        self.stats.ticks += 1;
        if frame.is_some() {
            self.stats.frames_composed += 1;
        }
        counter!("sensor_display_ticks_total").increment(1);

        debug!(
            tick = self.tick,
            fresh = meta.fresh_sources.len(),
            stale = meta.stale_sources.len(),
            extrapolated = meta.extrapolated_sources.len(),
            has_frame = frame.is_some(),
            "composite built"
        );

        CompositeFrame {
            tick: self.tick,
            composed_at: now,
            frame,
            overlay,
            meta,
        }
    }

    /// Ticks produced so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    pub fn into_stats(self) -> RunStats {
        self.stats
    }

    pub fn last_known(&self, sensor_id: &str) -> Option<&LastKnown> {
        self.sources
            .iter()
            .find(|s| s.sensor_id == sensor_id)
            .map(|s| &s.last)
    }

    pub fn policy(&self, sensor_id: &str) -> Option<StalenessPolicy> {
        self.sources
            .iter()
            .find(|s| s.sensor_id == sensor_id)
            .map(|s| s.policy)
    }
}
