//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Responsibilities:
//! - Deterministic display-vs-sampler timing scenarios
//! - Threaded pipeline runs with real clocks
//! - Failure containment and shutdown / release guarantees

#[cfg(test)]
mod contract_tests {
    use contracts::DisplayBlueprint;

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = DisplayBlueprint::default();
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_ok());
        assert_eq!(blueprint.source_count(), 4);
    }
}

#[cfg(test)]
mod simulation_tests {
    use std::time::Duration;

    use aggregator::{Aggregator, AggregatorConfig};
    use contracts::{Sample, SamplePayload, SensorId, SensorKind};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use sampler::{latest_channel, LatestSender, SourceFeed};

    const NANOS_PER_SEC: u64 = 1_000_000_000;

    fn counter_feed(id: &str, period: Duration) -> (LatestSender, SourceFeed) {
        let (tx, rx) = latest_channel(id);
        let feed = SourceFeed {
            sensor_id: SensorId::from(id),
            kind: SensorKind::Counter,
            nominal_period: Some(period),
            receiver: rx,
        };
        (tx, feed)
    }

    fn counter_sample(id: &str, value: u64, at_nanos: u64) -> Sample {
        Sample {
            sensor_id: id.into(),
            timestamp: Duration::from_nanos(at_nanos),
            sequence: value,
            payload: SamplePayload::Counter(value),
        }
    }

    fn assert_non_decreasing(values: &[Option<u64>]) {
        let shown: Vec<u64> = values.iter().flatten().copied().collect();
        for pair in shown.windows(2) {
            assert!(pair[0] <= pair[1], "displayed value decreased: {values:?}");
        }
    }

    /// 10 Hz counter shown at 24 Hz for one second
    #[test]
    fn test_24hz_display_of_10hz_counter() {
        let period_ns = NANOS_PER_SEC / 10;
        let tick_ns = NANOS_PER_SEC / 24;
        let (tx, feed) = counter_feed("sensor1", Duration::from_nanos(period_ns));
        let mut agg = Aggregator::new(vec![feed], AggregatorConfig::default());

        let mut next_value = 1u64;
        let mut shown = Vec::new();
        for k in 1..=24u64 {
            let now = k * tick_ns;
            while next_value * period_ns <= now {
                tx.put(counter_sample("sensor1", next_value, next_value * period_ns));
                next_value += 1;
            }
            let composite = agg.tick(Duration::from_nanos(now));
            assert_eq!(composite.overlay.len(), 1);
            shown.push(composite.value_of("sensor1"));
        }

        // Nothing sampled before the first 100 ms
        assert_eq!(&shown[..2], &[None, None]);
        assert_eq!(agg.stats().ticks, 24);
        assert_non_decreasing(&shown);

        // Each tick shows the count of whole periods elapsed
        for (k, value) in (1..=24u64).zip(&shown) {
            let expected = (k * tick_ns) / period_ns;
            assert_eq!(value.unwrap_or(0), expected, "tick {k}");
        }

        // Steps of exactly one, each value held for one ~0.1 s window
        let values: Vec<u64> = shown.iter().flatten().copied().collect();
        assert!(values.windows(2).all(|w| w[1] - w[0] <= 1), "{values:?}");
        for v in values[0]..=*values.last().unwrap() {
            let held = values.iter().filter(|x| **x == v).count();
            assert!((2..=3).contains(&held), "value {v} shown on {held} ticks");
        }

        let last = shown.last().copied().flatten().unwrap();
        assert!((9..=11).contains(&last), "final value {last}");
    }

    /// Sampler delivers late by random amounts; values shown stay monotone
    /// and close to the true count
    #[test]
    fn test_jittered_delivery_stays_monotone() {
        let period_ns = NANOS_PER_SEC / 10;
        let tick_ns = NANOS_PER_SEC / 30;
        let max_lag_ns = 150_000_000u64;

        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);

            // Delivery time of value j: j*P plus lag, kept strictly increasing
            let mut deliveries = Vec::new();
            let mut prev = 0u64;
            for j in 1..=40u64 {
                let at = (j * period_ns + rng.random_range(0..max_lag_ns)).max(prev + 1);
                deliveries.push((j, at));
                prev = at;
            }

            let (tx, feed) = counter_feed("sensor1", Duration::from_nanos(period_ns));
            let mut agg = Aggregator::new(vec![feed], AggregatorConfig::default());

            let mut pending = deliveries.iter().peekable();
            let mut shown = Vec::new();
            for k in 1..=90u64 {
                let now = k * tick_ns;
                while let Some(&&(value, at)) = pending.peek() {
                    if at > now {
                        break;
                    }
                    tx.put(counter_sample("sensor1", value, at));
                    pending.next();
                }
                shown.push(agg.tick(Duration::from_nanos(now)).value_of("sensor1"));
            }

            assert_non_decreasing(&shown);

            // At t = 3 s the true count is 30; lag can hide at most two periods
            let last = shown.last().copied().flatten().unwrap();
            assert!((28..=30).contains(&last), "seed {seed}: final value {last}");
        }
    }

    /// Extrapolation fills ticks between sparse samples
    #[test]
    fn test_sparse_counter_is_extrapolated() {
        let period = Duration::from_millis(100);
        let (tx, feed) = counter_feed("slow", period);
        let mut agg = Aggregator::new(vec![feed], AggregatorConfig::default());

        // One real sample, then silence for 350 ms
        tx.put(counter_sample("slow", 7, 100_000_000));
        let first = agg.tick(Duration::from_millis(100));
        assert_eq!(first.value_of("slow"), Some(7));
        assert!(!first.line("slow").unwrap().extrapolated);

        let later = agg.tick(Duration::from_millis(450));
        assert_eq!(later.value_of("slow"), Some(10));
        assert!(later.line("slow").unwrap().extrapolated);
        assert_eq!(agg.stats().source("slow").unwrap().extrapolated_ticks, 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use aggregator::{Aggregator, AggregatorConfig, RunConfig, StopReason};
    use config_loader::{ConfigFormat, ConfigLoader, ConfigOverrides};
    use contracts::{
        CameraConfig, CaptureDevice, CompositeFrame, ContractError, CounterConfig,
        DisplayBlueprint, FrameData, MonotonicClock, PixelFormat, Renderer, SampleContext,
        SamplePayload, SensorId, SensorKind, SensorSource, SourceError, StopSignal,
    };
    use render::QuitSignal;
    use sampler::{SamplerExit, SamplerGroup};
    use source_factory::{CameraSpec, DeviceOpener, FactoryError, FrameSource, SourceFactory, SourceSpec};

    /// Collects composites; shared so the test can inspect them afterwards
    #[derive(Clone, Default)]
    struct Recorder {
        frames: Arc<Mutex<Vec<CompositeFrame>>>,
    }

    impl Renderer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn render(&mut self, frame: &CompositeFrame) -> Result<(), ContractError> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn quit_requested(&self) -> bool {
            false
        }

        fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn run_ticks(
        sources: Vec<Box<dyn SensorSource>>,
        frequency_hz: f64,
        ticks: u64,
        join_timeout: Duration,
    ) -> (Vec<CompositeFrame>, sampler::ShutdownReport) {
        let clock = MonotonicClock::shared();
        let stop = StopSignal::new();
        let (group, feeds) =
            SamplerGroup::start(sources, clock.clone(), stop.clone(), join_timeout).unwrap();

        let mut agg = Aggregator::new(feeds, AggregatorConfig::default());
        let mut recorder = Recorder::default();
        let config = RunConfig {
            max_ticks: Some(ticks),
            ..RunConfig::from_frequency(frequency_hz).unwrap()
        };
        let reason = aggregator::run(&mut agg, &mut recorder, clock.as_ref(), &stop, config);
        assert_eq!(reason, StopReason::TickBudget);

        let report = group.shutdown(join_timeout);
        let frames = recorder.frames.lock().unwrap().clone();
        (frames, report)
    }

    /// Camera + two counters on real threads
    #[test]
    fn test_threaded_pipeline() {
        let blueprint = DisplayBlueprint {
            camera: Some(CameraConfig {
                width: 32,
                height: 24,
                frame_rate_hz: 60.0,
                ..CameraConfig::default()
            }),
            counters: vec![CounterConfig::new("fast", 10), CounterConfig::new("slow", 100)],
            ..DisplayBlueprint::default()
        };
        let sources = SourceFactory::new().build_from_blueprint(&blueprint).unwrap();

        let (frames, report) = run_ticks(sources, 50.0, 25, Duration::from_secs(1));

        assert_eq!(frames.len(), 25);
        assert!(report.is_clean());
        assert_eq!(report.joined.len(), 3);
        assert!(report.joined.iter().all(|r| r.exit == SamplerExit::Stopped));

        let last = frames.last().unwrap();
        let image = last.frame.as_ref().expect("camera frame displayed");
        assert_eq!((image.width, image.height), (32, 24));

        let ids: Vec<&str> = last.overlay.iter().map(|l| l.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["fast", "slow"]);
        assert_eq!(last.overlay[1].origin, (10, 70));

        let fast: Vec<u64> = frames.iter().filter_map(|f| f.value_of("fast")).collect();
        assert!(fast.windows(2).all(|w| w[0] <= w[1]));
        assert!(*fast.last().unwrap() >= 20);
    }

    /// Device that yields one frame, then only failed grabs
    struct OneShotDevice {
        served: bool,
        releases: Arc<AtomicUsize>,
    }

    impl CaptureDevice for OneShotDevice {
        fn describe(&self) -> String {
            "one-shot".to_string()
        }

        fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError> {
            if self.served {
                return Ok(None);
            }
            self.served = true;
            FrameData::new(2, 2, PixelFormat::Bgr8, vec![42u8; 12]).map(Some)
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_failing_camera_keeps_last_frame() {
        let releases = Arc::new(AtomicUsize::new(0));
        let device = OneShotDevice {
            served: false,
            releases: releases.clone(),
        };
        let source = FrameSource::new("camera", Box::new(device), Duration::from_millis(5));

        let (frames, report) = run_ticks(vec![Box::new(source)], 100.0, 20, Duration::from_secs(1));

        let shown: Vec<&FrameData> = frames.iter().filter_map(|f| f.frame.as_ref()).collect();
        assert!(!shown.is_empty());
        assert!(shown.iter().all(|f| f.data.iter().all(|b| *b == 42)));

        let camera = &report.joined[0];
        assert_eq!(camera.exit, SamplerExit::Stopped);
        assert_eq!(camera.samples, 1);
        assert!(camera.transient_failures > 0);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    /// Source that ignores the stop flag while sampling
    struct StuckSource {
        id: SensorId,
    }

    impl SensorSource for StuckSource {
        fn sensor_id(&self) -> &SensorId {
            &self.id
        }

        fn kind(&self) -> SensorKind {
            SensorKind::Counter
        }

        fn nominal_period(&self) -> Option<Duration> {
            Some(Duration::from_millis(400))
        }

        fn get(&mut self, _ctx: &SampleContext<'_>) -> Result<Option<SamplePayload>, SourceError> {
            std::thread::sleep(Duration::from_millis(400));
            Ok(Some(SamplePayload::Counter(1)))
        }
    }

    #[test]
    fn test_stuck_sampler_bounded_by_join_timeout() {
        let stuck = StuckSource { id: "stuck".into() };
        let (_, report) = run_ticks(vec![Box::new(stuck)], 100.0, 2, Duration::from_millis(50));

        assert!(!report.is_clean());
        assert_eq!(report.timed_out, vec![SensorId::from("stuck")]);
        assert!(report.elapsed < Duration::from_millis(300));
    }

    /// Opener whose devices count releases; `synthetic:9` fails to open
    #[derive(Default)]
    struct TrackingOpener {
        releases: Arc<Mutex<HashMap<String, usize>>>,
    }

    struct TrackedDevice {
        id: String,
        releases: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl CaptureDevice for TrackedDevice {
        fn describe(&self) -> String {
            self.id.clone()
        }

        fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError> {
            FrameData::new(1, 1, PixelFormat::Gray8, vec![0u8]).map(Some)
        }

        fn release(&mut self) {
            *self.releases.lock().unwrap().entry(self.id.clone()).or_default() += 1;
        }
    }

    impl DeviceOpener for TrackingOpener {
        fn open(
            &self,
            spec: &CameraSpec,
            config: &CameraConfig,
        ) -> source_factory::Result<Box<dyn CaptureDevice>> {
            if matches!(spec, CameraSpec::Synthetic(9)) {
                return Err(FactoryError::camera_open(&config.id, spec.to_string(), "device busy"));
            }
            Ok(Box::new(TrackedDevice {
                id: config.id.clone(),
                releases: self.releases.clone(),
            }))
        }
    }

    fn camera(id: &str, device: &str) -> SourceSpec {
        SourceSpec::Camera(CameraConfig {
            id: id.to_string(),
            device: device.to_string(),
            ..CameraConfig::default()
        })
    }

    #[test]
    fn test_partial_construction_releases_exactly_once() {
        let opener = TrackingOpener::default();
        let releases = opener.releases.clone();
        let factory = SourceFactory::with_opener(opener);

        let specs = vec![
            camera("cam_a", "synthetic"),
            SourceSpec::Counter(CounterConfig::new("sensor0", 10)),
            camera("cam_b", "synthetic:9"),
        ];
        let err = factory.build(&specs).err().unwrap();
        assert!(matches!(err, FactoryError::CameraOpenFailed { ref sensor_id, .. } if sensor_id == "cam_b"));

        let releases = releases.lock().unwrap();
        assert_eq!(releases.get("cam_a"), Some(&1));
        assert_eq!(releases.get("cam_b"), None);
    }

    #[test]
    fn test_shutdown_releases_each_device_once() {
        let opener = TrackingOpener::default();
        let releases = opener.releases.clone();
        let factory = SourceFactory::with_opener(opener);

        let specs = vec![
            camera("cam_a", "synthetic"),
            SourceSpec::Counter(CounterConfig::new("sensor0", 10)),
        ];
        let sources = factory.build(&specs).unwrap();
        let (_, report) = run_ticks(sources, 100.0, 5, Duration::from_secs(1));

        assert!(report.is_clean());
        assert!(report.unreleased.is_empty());
        assert_eq!(releases.lock().unwrap().get("cam_a"), Some(&1));
    }

    /// Config text + overrides -> file renderer output on disk
    #[tokio::test]
    async fn test_config_to_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let toml = r#"
[display]
frequency_hz = 30.0

[camera]
device = "synthetic:2"

[[counters]]
id = "sensor0"
period_ms = 10

[[renderers]]
name = "log"
kind = "log"
"#;
        let mut blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        ConfigOverrides {
            resolution: Some((16, 12)),
            frequency_hz: Some(50.0),
            output_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
        .apply(&mut blueprint)
        .unwrap();
        assert_eq!(blueprint.renderers.len(), 2);

        let quit = QuitSignal::new();
        let mut renderers = render::create_renderers(&blueprint.renderers, quit.clone()).unwrap();
        let sources = SourceFactory::new().build_from_blueprint(&blueprint).unwrap();

        let frequency_hz = blueprint.display.frequency_hz;
        let join_timeout = blueprint.display.join_timeout();
        let handle = tokio::task::spawn_blocking(move || {
            let clock = MonotonicClock::shared();
            let stop = StopSignal::new();
            let (group, feeds) =
                SamplerGroup::start(sources, clock.clone(), stop.clone(), join_timeout).unwrap();
            let mut agg = Aggregator::new(feeds, AggregatorConfig::default());
            let config = RunConfig {
                max_ticks: Some(10),
                ..RunConfig::from_frequency(frequency_hz).unwrap()
            };
            let reason = aggregator::run(&mut agg, &mut renderers, clock.as_ref(), &stop, config);
            let report = group.shutdown(join_timeout);
            renderers.close().unwrap();
            (reason, report, renderers.counts())
        });
        let (reason, report, counts) = handle.await.unwrap();

        assert_eq!(reason, StopReason::TickBudget);
        assert!(report.is_clean());
        assert!(counts.iter().all(|(_, c)| c.rendered == 10 && c.failed == 0));

        let overlay = std::fs::read_to_string(dir.path().join("overlay/10.json")).unwrap();
        let overlay: serde_json::Value = serde_json::from_str(&overlay).unwrap();
        assert_eq!(overlay["overlay"][0]["sensor_id"], "sensor0");

        let png = dir.path().join("frames/10.png");
        let image = image::open(png).unwrap();
        assert_eq!((image.width(), image.height()), (16, 12));
    }
}
