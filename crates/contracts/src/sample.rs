//! Sample - sampler output
//!
//! One timestamped reading taken from a source.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{ContractError, SensorId};

/// Source category
///
/// Decides how the aggregator treats a source that produced nothing new
/// since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Periodic integer counter with a fixed nominal period
    Counter,
    /// Frame source backed by a capture device
    Camera,
}

/// One reading
#[derive(Debug, Clone)]
pub struct Sample {
    /// Producing source
    pub sensor_id: SensorId,

    /// Monotonic capture time, measured from the clock epoch
    pub timestamp: Duration,

    /// Per-source generation number, strictly increasing
    pub sequence: u64,

    /// Reading payload
    pub payload: SamplePayload,
}

impl Sample {
    /// Counter value, if this is a counter reading
    pub fn counter_value(&self) -> Option<u64> {
        match self.payload {
            SamplePayload::Counter(value) => Some(value),
            SamplePayload::Frame(_) => None,
        }
    }
}

/// Reading payload
#[derive(Debug, Clone)]
pub enum SamplePayload {
    /// Periodic counter value
    Counter(u64),

    /// Captured frame
    Frame(FrameData),
}

/// Captured frame (zero-copy clone via `Bytes`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Bytes,
}

impl FrameData {
    /// Build a frame, checking the buffer against its geometry
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: impl Into<Bytes>,
    ) -> Result<Self, ContractError> {
        let data = data.into();
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ContractError::FrameSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Row stride in bytes
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

/// Pixel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Blue-green-red, 8 bits each (capture device native order)
    Bgr8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgr8 | Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}
