//! Capture device opening
//!
//! [`DeviceOpener`] is the seam between the factory and the capture
//! backends, so tests can substitute devices that fail or count releases.

use contracts::{CameraConfig, CaptureDevice};
use tracing::info;

use crate::device_spec::CameraSpec;
use crate::devices::{ImageSequenceCamera, SyntheticCamera};
use crate::error::{FactoryError, Result};

/// Opens a capture device for a camera configuration
pub trait DeviceOpener {
    fn open(&self, spec: &CameraSpec, config: &CameraConfig) -> Result<Box<dyn CaptureDevice>>;
}

/// Built-in backends: synthetic pattern and image sequence.
///
/// Platform capture devices (`/dev/videoN`) need a driver backend; without
/// one they fail to open, which is a fatal startup error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeviceOpener;

impl DeviceOpener for DefaultDeviceOpener {
    fn open(&self, spec: &CameraSpec, config: &CameraConfig) -> Result<Box<dyn CaptureDevice>> {
        let device: Box<dyn CaptureDevice> = match spec {
            CameraSpec::Synthetic(variant) => {
                Box::new(SyntheticCamera::new(*variant, config.width, config.height)?)
            }
            CameraSpec::ImageSequence(dir) => {
                Box::new(ImageSequenceCamera::open(dir, config.width, config.height)?)
            }
            CameraSpec::Video(index) => {
                let path = format!("/dev/video{index}");
                let message = if std::path::Path::new(&path).exists() {
                    "no capture backend available for video devices"
                } else {
                    "device does not exist"
                };
                return Err(FactoryError::camera_open(&config.id, path, message));
            }
        };

        info!(
            sensor_id = %config.id,
            device = %device.describe(),
            "capture device opened"
        );
        Ok(device)
    }
}
