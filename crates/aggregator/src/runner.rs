//! Fixed-rate tick loop
//!
//! Waits on an absolute tick schedule (missed instants are skipped, not
//! replayed), composes, hands the composite to the renderer and polls the
//! renderer's quit flag. Returns when the stop flag fires, quit is
//! requested, or the tick budget is used up.

use std::time::Duration;

use contracts::{
    interval_from_hz, Clock, ContractError, MissedTickBehavior, PeriodicTimer, Renderer, StopSignal,
};
use tracing::{debug, error, info, instrument};

use crate::aggregator::Aggregator;

/// Tick loop settings
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Interval between composites
    pub tick_interval: Duration,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
}

impl RunConfig {
    /// Unbounded loop at `frequency_hz`; rejects rates with no usable period
    pub fn from_frequency(frequency_hz: f64) -> Result<Self, ContractError> {
        Ok(Self {
            tick_interval: interval_from_hz("display.frequency_hz", frequency_hz)?,
            max_ticks: None,
        })
    }
}

/// Why the tick loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shared stop flag observed
    StopSignal,
    /// Renderer reported a quit request
    QuitRequested,
    /// `max_ticks` reached
    TickBudget,
}

/// Run the tick loop until one of the stop conditions holds
#[instrument(
    name = "aggregator_run",
    skip(aggregator, renderer, clock, stop),
    fields(
        renderer = renderer.name(),
        tick_interval_ms = config.tick_interval.as_secs_f64() * 1000.0,
        max_ticks = ?config.max_ticks
    )
)]
pub fn run(
    aggregator: &mut Aggregator,
    renderer: &mut dyn Renderer,
    clock: &dyn Clock,
    stop: &StopSignal,
    config: RunConfig,
) -> StopReason {
    info!("aggregator loop started");
    let mut timer = PeriodicTimer::new(config.tick_interval, clock.now(), MissedTickBehavior::Skip);

    let reason = loop {
        if stop.is_triggered() {
            break StopReason::StopSignal;
        }
        if config
            .max_ticks
            .is_some_and(|max| aggregator.tick_count() >= max)
        {
            break StopReason::TickBudget;
        }

        let Some(skipped) = timer.wait(clock, stop) else {
            break StopReason::StopSignal;
        };
        if skipped > 0 {
            aggregator.stats_mut().skipped_ticks += skipped;
            debug!(skipped, "aggregator fell behind, ticks skipped");
        }

        let composite = aggregator.tick(clock.now());
        if let Err(e) = renderer.render(&composite) {
            aggregator.stats_mut().render_errors += 1;
            error!(renderer = renderer.name(), tick = composite.tick, error = %e, "render failed");
        }

        if renderer.quit_requested() {
            break StopReason::QuitRequested;
        }
    };

    info!(
        reason = ?reason,
        ticks = aggregator.tick_count(),
        "aggregator loop finished"
    );
    reason
}
