//! Layered error definitions
//!
//! Categorized by origin: config / device / source / render

use thiserror::Error;

use crate::SensorId;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Capture device could not be opened
    #[error("cannot open capture device '{device}': {message}")]
    DeviceOpen { device: String, message: String },

    /// Capture device read failure
    #[error("capture device '{device}' read error: {message}")]
    DeviceRead { device: String, message: String },

    /// Frame buffer does not match its declared geometry
    #[error("invalid frame: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    // ===== Render Errors =====
    /// Renderer write error
    #[error("renderer '{renderer}' error: {message}")]
    Render { renderer: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device open error
    pub fn device_open(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceOpen {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create device read error
    pub fn device_read(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceRead {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create renderer error
    pub fn render(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            renderer: renderer.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by [`SensorSource::get`](crate::SensorSource::get).
///
/// Transient failures are logged and the sampler keeps going; terminal
/// failures end that sampler while the rest of the pipeline stays live.
#[derive(Debug, Error)]
pub enum SourceError {
    /// One read failed, the next may succeed
    #[error("transient failure on '{sensor_id}': {message}")]
    Transient { sensor_id: SensorId, message: String },

    /// The source cannot produce any more samples
    #[error("terminal failure on '{sensor_id}': {message}")]
    Terminal { sensor_id: SensorId, message: String },
}

impl SourceError {
    pub fn transient(sensor_id: &SensorId, message: impl Into<String>) -> Self {
        Self::Transient {
            sensor_id: sensor_id.clone(),
            message: message.into(),
        }
    }

    pub fn terminal(sensor_id: &SensorId, message: impl Into<String>) -> Self {
        Self::Terminal {
            sensor_id: sensor_id.clone(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn sensor_id(&self) -> &SensorId {
        match self {
            Self::Transient { sensor_id, .. } | Self::Terminal { sensor_id, .. } => sensor_id,
        }
    }
}
