//! # Sampler
//!
//! Per-source sampling threads and their handoff channels.
//!
//! Responsibilities:
//! - `LatestChannel`: single-slot, overwrite-on-full, non-blocking handoff
//! - One sampler thread per source, paced by the source itself
//! - Contain transient failures, end only the failing sampler on terminal ones
//! - Cooperative shutdown: stop flag, bounded join, resource release
//!
//! ## Usage Example
//!
//! ```ignore
//! use sampler::SamplerGroup;
//!
//! let (group, feeds) = SamplerGroup::start(sources, clock, stop, join_timeout)?;
//! // hand `feeds` to the aggregator ...
//! let report = group.shutdown(join_timeout);
//! ```

mod channel;
mod coordinator;
mod error;
mod group;
mod stats;
mod worker;

// Re-exports
pub use channel::{latest_channel, LatestReceiver, LatestSender};
pub use coordinator::{ShutdownCoordinator, ShutdownReport};
pub use error::{Result, SamplerError};
pub use group::{SamplerGroup, SourceFeed};
pub use stats::{ChannelMetrics, ChannelMetricsSnapshot};
pub use worker::{spawn, JoinOutcome, SamplerExit, SamplerHandle, SamplerReport};
