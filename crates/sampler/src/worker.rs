//! Sampler thread
//!
//! One thread per source. Each iteration waits inside `Source::get` (the
//! source's own cadence), stamps the payload and overwrites the channel
//! slot. The stop flag is checked once per iteration.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    ResourceGuard, Sample, SampleContext, SensorId, SensorSource, SharedClock, StopSignal,
};
use metrics::counter;
use tracing::{debug, error, info, instrument};

use crate::channel::LatestSender;
use crate::error::{Result, SamplerError};

/// Poll interval while waiting for a sampler thread to finish
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Why a sampler thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerExit {
    /// Stop flag observed
    Stopped,
    /// Source reported a terminal failure
    Failed(String),
    /// Source panicked inside `get`
    Panicked(String),
}

/// Final accounting of one sampler thread
#[derive(Debug, Clone)]
pub struct SamplerReport {
    pub sensor_id: SensorId,
    /// Samples written to the channel
    pub samples: u64,
    /// Transient failures logged
    pub transient_failures: u64,
    pub exit: SamplerExit,
}

/// Result of a bounded join
#[derive(Debug)]
pub enum JoinOutcome {
    Joined(SamplerReport),
    /// The thread did not finish within the timeout
    TimedOut,
}

/// Handle to a running sampler thread
#[derive(Debug)]
pub struct SamplerHandle {
    sensor_id: SensorId,
    thread: Option<JoinHandle<SamplerReport>>,
    guard: Option<Arc<dyn ResourceGuard>>,
}

impl SamplerHandle {
    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    /// Resource guard of the driven source, if it owns one
    pub fn resource_guard(&self) -> Option<&Arc<dyn ResourceGuard>> {
        self.guard.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait up to `timeout` for the thread to end.
    ///
    /// On timeout the thread is left running (detached when the handle is
    /// dropped). A timeout past the clock's range waits without a deadline.
    pub fn join_timeout(&mut self, timeout: Duration) -> JoinOutcome {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match &self.thread {
                None => return JoinOutcome::TimedOut,
                Some(t) if t.is_finished() => break,
                Some(_) => {}
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => JOIN_POLL_INTERVAL,
            };
            if remaining.is_zero() {
                return JoinOutcome::TimedOut;
            }
            thread::sleep(JOIN_POLL_INTERVAL.min(remaining));
        }

        let Some(thread) = self.thread.take() else {
            return JoinOutcome::TimedOut;
        };
        // The loop body catches source panics, so a join error is unexpected
        match thread.join() {
            Ok(report) => JoinOutcome::Joined(report),
            Err(_) => JoinOutcome::Joined(SamplerReport {
                sensor_id: self.sensor_id.clone(),
                samples: 0,
                transient_failures: 0,
                exit: SamplerExit::Panicked("sampler thread panicked".to_string()),
            }),
        }
    }
}

/// Start a sampler thread driving `source` into `tx`
#[instrument(
    name = "sampler_spawn",
    skip(source, tx, clock, stop),
    fields(sensor_id = %source.sensor_id())
)]
pub fn spawn(
    source: Box<dyn SensorSource>,
    tx: LatestSender,
    clock: SharedClock,
    stop: StopSignal,
) -> Result<SamplerHandle> {
    let sensor_id = source.sensor_id().clone();
    let guard = source.resource_guard();

    let thread = thread::Builder::new()
        .name(format!("sampler-{sensor_id}"))
        .spawn(move || run(source, tx, clock, stop))
        .map_err(|e| SamplerError::SpawnFailed {
            sensor_id: sensor_id.to_string(),
            source: e,
        })?;

    debug!("sampler thread started");
    Ok(SamplerHandle {
        sensor_id,
        thread: Some(thread),
        guard,
    })
}

/// Sampler loop body
fn run(
    mut source: Box<dyn SensorSource>,
    tx: LatestSender,
    clock: SharedClock,
    stop: StopSignal,
) -> SamplerReport {
    let sensor_id = source.sensor_id().clone();
    let ctx = SampleContext::new(clock.as_ref(), &stop);

    let mut sequence = 0u64;
    let mut last_timestamp: Option<Duration> = None;
    let mut transient_failures = 0u64;

    info!(sensor_id = %sensor_id, kind = ?source.kind(), "sampler running");

    let exit = loop {
        if stop.is_triggered() {
            break SamplerExit::Stopped;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| source.get(&ctx)));
        match result {
            Ok(Ok(Some(payload))) => {
                sequence += 1;
                let timestamp = strictly_after(clock.now(), last_timestamp);
                last_timestamp = Some(timestamp);

                let replaced = tx.put(Sample {
                    sensor_id: sensor_id.clone(),
                    timestamp,
                    sequence,
                    payload,
                });
                counter!("sensor_display_samples_total", "sensor_id" => sensor_id.to_string())
                    .increment(1);
                if replaced.is_some() {
                    counter!(
                        "sensor_display_samples_overwritten_total",
                        "sensor_id" => sensor_id.to_string()
                    )
                    .increment(1);
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) if e.is_transient() => {
                transient_failures += 1;
                error!(sensor_id = %sensor_id, error = %e, "transient sample failure");
                counter!(
                    "sensor_display_transient_failures_total",
                    "sensor_id" => sensor_id.to_string()
                )
                .increment(1);
            }
            Ok(Err(e)) => {
                error!(sensor_id = %sensor_id, error = %e, "sampler terminated by source failure");
                break SamplerExit::Failed(e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(sensor_id = %sensor_id, panic = %message, "sampler terminated by panic");
                break SamplerExit::Panicked(message);
            }
        }
    };

    let reason = match &exit {
        SamplerExit::Stopped => "stopped",
        SamplerExit::Failed(_) => "failed",
        SamplerExit::Panicked(_) => "panicked",
    };
    counter!(
        "sensor_display_sampler_exits_total",
        "sensor_id" => sensor_id.to_string(),
        "reason" => reason
    )
    .increment(1);

    info!(
        sensor_id = %sensor_id,
        samples = sequence,
        transient_failures,
        reason,
        "sampler exited"
    );

    SamplerReport {
        sensor_id,
        samples: sequence,
        transient_failures,
        exit,
    }
}

/// Timestamps are strictly increasing per source, even if the clock did
/// not advance between two samples
fn strictly_after(now: Duration, last: Option<Duration>) -> Duration {
    match last {
        Some(last) if now <= last => last + Duration::from_nanos(1),
        _ => now,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::latest_channel;
    use contracts::{
        ManualClock, MonotonicClock, SamplePayload, SensorKind, SourceError,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc;

    /// Scripted source: replays a list of results, then idles until stopped
    struct ScriptedSource {
        id: SensorId,
        script: Vec<std::result::Result<Option<SamplePayload>, SourceError>>,
        calls: Arc<AtomicU64>,
    }

    impl SensorSource for ScriptedSource {
        fn sensor_id(&self) -> &SensorId {
            &self.id
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Counter
        }

        fn nominal_period(&self) -> Option<Duration> {
            None
        }

        fn get(
            &mut self,
            ctx: &SampleContext<'_>,
        ) -> std::result::Result<Option<SamplePayload>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.script.is_empty() {
                ctx.stop.wait_timeout(Duration::from_millis(5));
                return Ok(None);
            }
            self.script.remove(0)
        }
    }

    /// Source that never returns from `get`
    struct StuckSource {
        id: SensorId,
    }

    impl SensorSource for StuckSource {
        fn sensor_id(&self) -> &SensorId {
            &self.id
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Camera
        }

        fn nominal_period(&self) -> Option<Duration> {
            None
        }

        fn get(
            &mut self,
            _ctx: &SampleContext<'_>,
        ) -> std::result::Result<Option<SamplePayload>, SourceError> {
            loop {
                thread::park();
            }
        }
    }

    struct PanickingSource {
        id: SensorId,
    }

    impl SensorSource for PanickingSource {
        fn sensor_id(&self) -> &SensorId {
            &self.id
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Counter
        }

        fn nominal_period(&self) -> Option<Duration> {
            None
        }

        fn get(
            &mut self,
            _ctx: &SampleContext<'_>,
        ) -> std::result::Result<Option<SamplePayload>, SourceError> {
            panic!("sensor exploded");
        }
    }

    fn scripted(
        script: Vec<std::result::Result<Option<SamplePayload>, SourceError>>,
    ) -> (Box<dyn SensorSource>, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        let source = ScriptedSource {
            id: "scripted".into(),
            script,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }

    #[test]
    fn test_transient_failure_keeps_sampler_alive() {
        let id = SensorId::from("scripted");
        let (source, _) = scripted(vec![
            Ok(Some(SamplePayload::Counter(1))),
            Err(SourceError::transient(&id, "glitch")),
            Ok(Some(SamplePayload::Counter(2))),
        ]);
        let (tx, rx) = latest_channel("scripted");
        let stop = StopSignal::new();
        let mut handle = spawn(source, tx, Arc::new(ManualClock::new()), stop.clone()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while rx.metrics().put < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        stop.trigger();

        let JoinOutcome::Joined(report) = handle.join_timeout(Duration::from_secs(5)) else {
            panic!("sampler did not stop");
        };
        assert_eq!(report.exit, SamplerExit::Stopped);
        assert_eq!(report.samples, 2);
        assert_eq!(report.transient_failures, 1);

        let latest = rx.try_take().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.counter_value(), Some(2));
    }

    #[test]
    fn test_terminal_failure_ends_only_this_sampler() {
        let id = SensorId::from("scripted");
        let (source, calls) = scripted(vec![
            Ok(Some(SamplePayload::Counter(1))),
            Err(SourceError::terminal(&id, "unplugged")),
            Ok(Some(SamplePayload::Counter(2))),
        ]);
        let (tx, rx) = latest_channel("scripted");
        let mut handle =
            spawn(source, tx, Arc::new(ManualClock::new()), StopSignal::new()).unwrap();

        let JoinOutcome::Joined(report) = handle.join_timeout(Duration::from_secs(5)) else {
            panic!("sampler did not exit");
        };
        assert!(matches!(report.exit, SamplerExit::Failed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Last good value stays readable and the channel reports the silence
        assert_eq!(rx.try_take().and_then(|s| s.counter_value()), Some(1));
        assert!(rx.is_disconnected());
    }

    #[test]
    fn test_panic_is_contained() {
        let (tx, rx) = latest_channel("boom");
        let source = Box::new(PanickingSource { id: "boom".into() });
        let mut handle =
            spawn(source, tx, Arc::new(ManualClock::new()), StopSignal::new()).unwrap();

        let JoinOutcome::Joined(report) = handle.join_timeout(Duration::from_secs(5)) else {
            panic!("sampler did not exit");
        };
        assert_eq!(report.exit, SamplerExit::Panicked("sensor exploded".to_string()));
        assert!(rx.is_disconnected());
    }

    #[test]
    fn test_join_timeout_is_a_hard_cap() {
        let (tx, _rx) = latest_channel("stuck");
        let stop = StopSignal::new();
        let source = Box::new(StuckSource { id: "stuck".into() });
        let mut handle = spawn(source, tx, MonotonicClock::shared(), stop.clone()).unwrap();

        stop.trigger();
        let start = Instant::now();
        assert!(matches!(
            handle.join_timeout(Duration::from_millis(50)),
            JoinOutcome::TimedOut
        ));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!handle.is_finished());
    }

    /// Yields one counter value per permit; blocks in `get` until one arrives
    struct GatedSource {
        id: SensorId,
        permits: mpsc::Receiver<()>,
        value: u64,
    }

    impl SensorSource for GatedSource {
        fn sensor_id(&self) -> &SensorId {
            &self.id
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Counter
        }

        fn nominal_period(&self) -> Option<Duration> {
            None
        }

        fn get(
            &mut self,
            _ctx: &SampleContext<'_>,
        ) -> std::result::Result<Option<SamplePayload>, SourceError> {
            if self.permits.recv().is_err() {
                return Ok(None);
            }
            self.value += 1;
            Ok(Some(SamplePayload::Counter(self.value)))
        }
    }

    #[test]
    fn test_at_most_one_put_after_stop() {
        let (permit_tx, permits) = mpsc::channel();
        let source = Box::new(GatedSource {
            id: "gated".into(),
            permits,
            value: 0,
        });
        let (tx, rx) = latest_channel("gated");
        let stop = StopSignal::new();
        let mut handle = spawn(source, tx, MonotonicClock::shared(), stop.clone()).unwrap();

        for _ in 0..3 {
            permit_tx.send(()).unwrap();
        }
        let deadline = Instant::now() + Duration::from_secs(5);
        while rx.metrics().put < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(rx.metrics().put, 3);

        // The sampler is now blocked inside `get`
        stop.trigger();
        let put_at_stop = rx.metrics().put;

        // Release the in-flight read and offer plenty more
        // (sends fail once the sampler has exited and dropped the source)
        for _ in 0..10 {
            let _ = permit_tx.send(());
        }

        let JoinOutcome::Joined(report) = handle.join_timeout(Duration::from_secs(5)) else {
            panic!("sampler did not stop");
        };
        assert_eq!(report.exit, SamplerExit::Stopped);

        thread::sleep(Duration::from_millis(20));
        let put_after = rx.metrics().put;
        assert!(put_after - put_at_stop <= 1, "{put_at_stop} -> {put_after}");
        assert_eq!(report.samples, put_after);
    }

    #[test]
    fn test_join_with_unbounded_timeout() {
        let (tx, _rx) = latest_channel("scripted");
        let (source, _) = scripted(vec![Ok(Some(SamplePayload::Counter(1)))]);
        let stop = StopSignal::new();
        let mut handle = spawn(source, tx, Arc::new(ManualClock::new()), stop.clone()).unwrap();

        stop.trigger();
        assert!(matches!(
            handle.join_timeout(Duration::MAX),
            JoinOutcome::Joined(_)
        ));
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        assert_eq!(strictly_after(Duration::from_millis(5), None), Duration::from_millis(5));
        assert_eq!(
            strictly_after(Duration::from_millis(5), Some(Duration::from_millis(5))),
            Duration::from_millis(5) + Duration::from_nanos(1)
        );
        assert_eq!(
            strictly_after(Duration::from_millis(6), Some(Duration::from_millis(5))),
            Duration::from_millis(6)
        );
    }
}
