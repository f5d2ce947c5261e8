//! SamplerGroup - owns every sampler thread of a pipeline

use std::time::Duration;

use contracts::{SensorId, SensorKind, SensorSource, SharedClock, StopSignal};
use tracing::{error, info, instrument};

use crate::channel::{latest_channel, LatestReceiver};
use crate::coordinator::{ShutdownCoordinator, ShutdownReport};
use crate::error::Result;
use crate::worker::{self, SamplerHandle};

/// Aggregator-side view of one source
#[derive(Debug)]
pub struct SourceFeed {
    pub sensor_id: SensorId,
    pub kind: SensorKind,
    /// Nominal period (counters only)
    pub nominal_period: Option<Duration>,
    pub receiver: LatestReceiver,
}

/// Running samplers plus the stop flag they share
#[derive(Debug)]
pub struct SamplerGroup {
    handles: Vec<SamplerHandle>,
    stop: StopSignal,
}

impl SamplerGroup {
    /// Spawn one sampler per source, in order.
    ///
    /// Returns the group and one feed per source (same order). If a thread
    /// fails to spawn, the samplers already running are stopped and joined
    /// and the remaining sources are dropped (releasing their resources).
    #[instrument(
        name = "sampler_group_start",
        skip(sources, clock, stop),
        fields(source_count = sources.len())
    )]
    pub fn start(
        sources: Vec<Box<dyn SensorSource>>,
        clock: SharedClock,
        stop: StopSignal,
        join_timeout: Duration,
    ) -> Result<(Self, Vec<SourceFeed>)> {
        let mut group = Self {
            handles: Vec::with_capacity(sources.len()),
            stop,
        };
        let mut feeds = Vec::with_capacity(sources.len());

        for source in sources {
            let (tx, rx) = latest_channel(source.sensor_id().clone());
            let feed = SourceFeed {
                sensor_id: source.sensor_id().clone(),
                kind: source.kind(),
                nominal_period: source.nominal_period(),
                receiver: rx,
            };

            match worker::spawn(source, tx, clock.clone(), group.stop.clone()) {
                Ok(handle) => {
                    group.handles.push(handle);
                    feeds.push(feed);
                }
                Err(e) => {
                    error!(sensor_id = %feed.sensor_id, error = %e, "sampler start failed, stopping group");
                    group.shutdown(join_timeout);
                    return Err(e);
                }
            }
        }

        info!(samplers = group.handles.len(), "all samplers started");
        Ok((group, feeds))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Number of samplers whose thread has ended
    pub fn finished_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_finished()).count()
    }

    /// Stop, join (bounded) and release
    pub fn shutdown(self, join_timeout: Duration) -> ShutdownReport {
        ShutdownCoordinator::new(self.stop, join_timeout).shutdown(self.handles)
    }
}
