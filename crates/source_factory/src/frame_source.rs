//! Frame source backed by a capture device
//!
//! The device lives behind a [`DeviceGuard`] shared between the source and
//! the shutdown coordinator. Whoever gets there first releases it; the
//! other side finds it already gone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    CaptureDevice, MissedTickBehavior, PeriodicTimer, ResourceGuard, SampleContext,
    SamplePayload, SensorId, SensorKind, SensorSource, SourceError,
};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Release-once wrapper around a capture device
pub struct DeviceGuard {
    sensor_id: SensorId,
    description: String,
    slot: Mutex<Option<Box<dyn CaptureDevice>>>,
}

impl DeviceGuard {
    pub fn new(sensor_id: SensorId, device: Box<dyn CaptureDevice>) -> Self {
        Self {
            sensor_id,
            description: device.describe(),
            slot: Mutex::new(Some(device)),
        }
    }

    /// Device description captured at open time
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Release, blocking until any in-flight read finishes
    pub fn release(&self) {
        let mut slot = self.slot.lock();
        Self::release_slot(&self.sensor_id, &self.description, &mut slot);
    }

    fn release_slot(
        sensor_id: &SensorId,
        description: &str,
        slot: &mut Option<Box<dyn CaptureDevice>>,
    ) {
        if let Some(mut device) = slot.take() {
            device.release();
            info!(sensor_id = %sensor_id, device = description, "capture device released");
        }
    }
}

impl ResourceGuard for DeviceGuard {
    fn try_release(&self, wait: Duration) -> bool {
        match self.slot.try_lock_for(wait) {
            Some(mut slot) => {
                Self::release_slot(&self.sensor_id, &self.description, &mut slot);
                true
            }
            None => false,
        }
    }

    fn is_released(&self) -> bool {
        self.slot.try_lock().is_some_and(|slot| slot.is_none())
    }
}

impl fmt::Debug for DeviceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceGuard")
            .field("sensor_id", &self.sensor_id)
            .field("device", &self.description)
            .finish()
    }
}

/// Camera-like source
///
/// Reads are paced at the device frame rate. A failed or empty read is a
/// transient error; reading a released device is terminal.
#[derive(Debug)]
pub struct FrameSource {
    sensor_id: SensorId,
    device: Arc<DeviceGuard>,
    frame_interval: Duration,
    timer: Option<PeriodicTimer>,
}

impl FrameSource {
    pub fn new(
        sensor_id: impl Into<SensorId>,
        device: Box<dyn CaptureDevice>,
        frame_interval: Duration,
    ) -> Self {
        let sensor_id = sensor_id.into();
        Self {
            device: Arc::new(DeviceGuard::new(sensor_id.clone(), device)),
            sensor_id,
            frame_interval,
            timer: None,
        }
    }

    pub fn device(&self) -> &DeviceGuard {
        &self.device
    }
}

impl SensorSource for FrameSource {
    fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Camera
    }

    fn nominal_period(&self) -> Option<Duration> {
        None
    }

    fn get(&mut self, ctx: &SampleContext<'_>) -> Result<Option<SamplePayload>, SourceError> {
        let timer = self.timer.get_or_insert_with(|| {
            PeriodicTimer::new(self.frame_interval, ctx.clock.now(), MissedTickBehavior::Skip)
        });
        if timer.wait(ctx.clock, ctx.stop).is_none() {
            return Ok(None);
        }

        let mut slot = self.device.slot.lock();
        let Some(device) = slot.as_mut() else {
            return Err(SourceError::terminal(&self.sensor_id, "capture device released"));
        };

        match device.read_frame() {
            Ok(Some(frame)) => Ok(Some(SamplePayload::Frame(frame))),
            Ok(None) => Err(SourceError::transient(
                &self.sensor_id,
                "failed to grab frame from camera",
            )),
            Err(e) => Err(SourceError::transient(&self.sensor_id, e.to_string())),
        }
    }

    fn resource_guard(&self) -> Option<Arc<dyn ResourceGuard>> {
        Some(self.device.clone() as Arc<dyn ResourceGuard>)
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        if self.device.slot.is_locked() {
            warn!(sensor_id = %self.sensor_id, "device busy during drop, waiting for release");
        }
        self.device.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, FrameData, ManualClock, PixelFormat, StopSignal};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Device that counts releases and fails on demand
    #[derive(Debug)]
    struct CountingDevice {
        releases: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CaptureDevice for CountingDevice {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError> {
            if self.fail {
                return Err(ContractError::device_read("counting", "boom"));
            }
            FrameData::new(1, 1, PixelFormat::Gray8, vec![7u8]).map(Some)
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn source(fail: bool) -> (FrameSource, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let device = CountingDevice {
            releases: releases.clone(),
            fail,
        };
        let source = FrameSource::new("camera", Box::new(device), Duration::from_millis(33));
        (source, releases)
    }

    #[test]
    fn test_read_frame() {
        let clock = ManualClock::new();
        let stop = StopSignal::new();
        let ctx = SampleContext::new(&clock, &stop);
        let (mut source, _) = source(false);

        match source.get(&ctx).unwrap() {
            Some(SamplePayload::Frame(frame)) => assert_eq!(frame.data.as_ref(), &[7u8]),
            other => panic!("unexpected payload: {other:?}"),
        }
        assert_eq!(source.kind(), SensorKind::Camera);
        assert_eq!(source.nominal_period(), None);
    }

    #[test]
    fn test_read_failure_is_transient() {
        let clock = ManualClock::new();
        let stop = StopSignal::new();
        let ctx = SampleContext::new(&clock, &stop);
        let (mut source, _) = source(true);

        let err = source.get(&ctx).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_released_exactly_once() {
        let (source, releases) = source(false);
        let guard = source.resource_guard().unwrap();

        assert!(!guard.is_released());
        assert!(guard.try_release(Duration::from_millis(10)));
        assert!(guard.is_released());
        assert!(guard.try_release(Duration::from_millis(10)));

        drop(source);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let (source, releases) = source(false);
        drop(source);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_after_external_release_is_terminal() {
        let clock = ManualClock::new();
        let stop = StopSignal::new();
        let ctx = SampleContext::new(&clock, &stop);
        let (mut source, _) = source(false);

        source.device().release();
        let err = source.get(&ctx).unwrap_err();
        assert!(!err.is_transient());
    }
}
