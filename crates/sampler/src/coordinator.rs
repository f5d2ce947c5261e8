//! ShutdownCoordinator - stop flag, bounded join, resource release
//!
//! Shutdown order:
//! 1. trigger the shared stop flag (once)
//! 2. join each sampler with a hard timeout
//! 3. for samplers that did not finish, try to release their source's
//!    resources from here; joined samplers already dropped their source

use std::time::{Duration, Instant};

use contracts::{SensorId, StopSignal};
use metrics::counter;
use tracing::{error, info, instrument, warn};

use crate::worker::{JoinOutcome, SamplerExit, SamplerHandle, SamplerReport};

/// How long to wait for a busy device when releasing it on behalf of a
/// stuck sampler
const RELEASE_WAIT: Duration = Duration::from_millis(50);

/// Outcome of a shutdown pass
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Samplers that finished within the timeout
    pub joined: Vec<SamplerReport>,

    /// Samplers still running after the timeout
    pub timed_out: Vec<SensorId>,

    /// Timed-out samplers whose resources could not be released yet
    pub unreleased: Vec<SensorId>,

    /// Wall time spent in shutdown
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Every sampler joined
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty()
    }

    /// Samplers that ended on a failure or panic before shutdown
    pub fn failed(&self) -> impl Iterator<Item = &SamplerReport> {
        self.joined
            .iter()
            .filter(|r| !matches!(r.exit, SamplerExit::Stopped))
    }
}

/// Drives cooperative shutdown of a sampler set
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    stop: StopSignal,
    join_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(stop: StopSignal, join_timeout: Duration) -> Self {
        Self { stop, join_timeout }
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Set the stop flag. Returns `true` for the first request only.
    pub fn request_stop(&self, reason: &str) -> bool {
        let first = self.stop.trigger();
        if first {
            info!(reason, "stop requested");
        }
        first
    }

    /// Stop and join all samplers, then release what is left
    #[instrument(
        name = "shutdown_coordinator_shutdown",
        skip(self, handles),
        fields(samplers = handles.len(), join_timeout_ms = self.join_timeout.as_millis() as u64)
    )]
    pub fn shutdown(&self, handles: Vec<SamplerHandle>) -> ShutdownReport {
        let start = Instant::now();
        self.request_stop("shutdown");

        let mut report = ShutdownReport::default();
        for mut handle in handles {
            match handle.join_timeout(self.join_timeout) {
                JoinOutcome::Joined(sampler) => report.joined.push(sampler),
                JoinOutcome::TimedOut => {
                    let sensor_id = handle.sensor_id().clone();
                    error!(
                        sensor_id = %sensor_id,
                        timeout_ms = self.join_timeout.as_millis() as u64,
                        "sampler did not stop within join timeout"
                    );
                    counter!(
                        "sensor_display_join_timeouts_total",
                        "sensor_id" => sensor_id.to_string()
                    )
                    .increment(1);

                    if let Some(guard) = handle.resource_guard() {
                        if !guard.try_release(RELEASE_WAIT) {
                            error!(
                                sensor_id = %sensor_id,
                                "resource busy, release deferred until sampler exits"
                            );
                            report.unreleased.push(sensor_id.clone());
                        }
                    }
                    report.timed_out.push(sensor_id);
                }
            }
        }

        report.elapsed = start.elapsed();
        if report.is_clean() {
            info!(
                joined = report.joined.len(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "all samplers joined"
            );
        } else {
            warn!(
                joined = report.joined.len(),
                timed_out = report.timed_out.len(),
                "shutdown finished with detached samplers"
            );
        }
        report
    }
}
