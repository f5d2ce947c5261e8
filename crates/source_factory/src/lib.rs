//! # Source Factory
//!
//! Builds sample sources from a `DisplayBlueprint`.
//!
//! Responsibilities:
//! - Construct periodic counters and frame sources
//! - Open capture devices from a device spec
//! - Roll back (release) already-built sources when a later one fails
//! - Guarantee each capture device is released exactly once

pub mod counter;
pub mod device_spec;
pub mod devices;
pub mod error;
pub mod factory;
pub mod frame_source;
pub mod opener;

pub use contracts::{DisplayBlueprint, SensorSource};
pub use counter::PeriodicCounter;
pub use device_spec::CameraSpec;
pub use devices::{ImageSequenceCamera, SyntheticCamera};
pub use error::{FactoryError, Result};
pub use factory::{SourceFactory, SourceSpec};
pub use frame_source::{DeviceGuard, FrameSource};
pub use opener::{DefaultDeviceOpener, DeviceOpener};
