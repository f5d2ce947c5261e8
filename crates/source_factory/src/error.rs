//! Source Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Source Factory specific error
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Device spec could not be interpreted
    #[error("invalid device spec '{spec}': {message}")]
    InvalidDeviceSpec { spec: String, message: String },

    /// Capture device could not be opened
    #[error("failed to open camera '{sensor_id}' ({device}): {message}")]
    CameraOpenFailed {
        sensor_id: String,
        device: String,
        message: String,
    },

    /// Two sources share an id
    #[error("duplicate source id '{sensor_id}'")]
    DuplicateSource { sensor_id: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl FactoryError {
    /// Create device spec error
    pub fn invalid_spec(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeviceSpec {
            spec: spec.into(),
            message: message.into(),
        }
    }

    /// Create camera open error
    pub fn camera_open(
        sensor_id: impl Into<String>,
        device: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CameraOpenFailed {
            sensor_id: sensor_id.into(),
            device: device.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, FactoryError>;
