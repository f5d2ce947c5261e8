//! # Aggregator
//!
//! Fixed-rate compositor over the latest sample of every source.
//!
//! Responsibilities:
//! - Drain each source's channel once per tick, without blocking
//! - Keep a per-source last-known record
//! - Apply the staleness policy (hold frames, extrapolate counters)
//! - Compose one `CompositeFrame` per tick and hand it to a renderer

mod aggregator;
mod last_known;
mod policy;
mod runner;
mod stats;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use last_known::LastKnown;
pub use policy::{Estimate, StalenessPolicy};
pub use runner::{run, RunConfig, StopReason};
pub use stats::{RunStats, SourceStats};
