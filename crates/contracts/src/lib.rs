//! # Contracts
//!
//! Shared interface contracts between the sampling, aggregation and
//! rendering crates. Business crates depend on this crate only; reverse
//! dependencies are prohibited.
//!
//! ## Time Model
//! - A single monotonic [`Clock`] drives sampler cadence, sample timestamps
//!   and the aggregator's extrapolation arithmetic.
//! - Timestamps are `Duration`s measured from the clock's epoch.
//! - `sequence` is a per-source generation counter, strictly increasing.

mod blueprint;
mod clock;
mod composite;
mod device;
mod error;
mod renderer;
mod sample;
mod sensor_id;
mod sensor_source;
mod stop;

pub use blueprint::*;
pub use clock::{Clock, ManualClock, MissedTickBehavior, MonotonicClock, PeriodicTimer, SharedClock};
pub use composite::*;
pub use device::CaptureDevice;
pub use error::*;
pub use renderer::Renderer;
pub use sample::*;
pub use sensor_id::SensorId;
pub use sensor_source::{ResourceGuard, SampleContext, SensorSource};
pub use stop::StopSignal;
