//! Pipeline orchestrator - coordinates all components.
//!
//! Startup order: sources, renderers, sampler threads, tick loop. Any
//! startup failure releases what was already built and aborts the run.
//! The tick loop runs on a blocking thread; Ctrl+C / SIGTERM only raise the
//! quit flag, and the loop's exit drives sampler shutdown.

use std::time::{Duration, Instant};

use aggregator::{Aggregator, AggregatorConfig, RunConfig};
use anyhow::{anyhow, Context, Result};
use contracts::{DisplayBlueprint, MonotonicClock, Renderer, StopSignal};
use render::QuitSignal;
use sampler::{SamplerGroup, ShutdownReport};
use source_factory::SourceFactory;
use tracing::{error, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Resolved configuration
    pub blueprint: DisplayBlueprint,

    /// Maximum number of composites (None = unlimited)
    pub max_ticks: Option<u64>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    quit: QuitSignal,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            quit: QuitSignal::new(),
        }
    }

    /// Quit flag shared with the renderers and the signal watcher
    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let join_timeout = blueprint.display.join_timeout();
        let run_config = RunConfig {
            max_ticks: self.config.max_ticks,
            ..RunConfig::from_frequency(blueprint.display.frequency_hz)
                .context("Invalid display frequency")?
        };

        // 1. Sources (camera first); partial construction is rolled back
        info!(sources = blueprint.source_count(), "Constructing sources...");
        let sources = SourceFactory::new()
            .build_from_blueprint(blueprint)
            .context("Failed to construct sources")?;

        // 2. Renderers
        let mut renderers = render::create_renderers(&blueprint.renderers, self.quit_signal())
            .context("Failed to create renderers")?;
        if renderers.is_empty() {
            warn!("No renderers configured - composites will be discarded");
        }

        // 3. Sampler threads
        let clock = MonotonicClock::shared();
        let stop = StopSignal::new();
        let (group, feeds) = SamplerGroup::start(sources, clock.clone(), stop.clone(), join_timeout)
            .context("Failed to start samplers")?;
        observability::record_sources_active(group.len());
        info!(samplers = group.len(), "Samplers running");

        // 4. Tick loop
        let mut agg = Aggregator::new(feeds, AggregatorConfig::default());

        let signal_task = tokio::spawn(watch_shutdown_signal(self.quit_signal()));

        let loop_clock = clock.clone();
        let loop_stop = stop.clone();
        let loop_result = tokio::task::spawn_blocking(move || {
            let reason = aggregator::run(
                &mut agg,
                &mut renderers,
                loop_clock.as_ref(),
                &loop_stop,
                run_config,
            );
            (agg, renderers, reason)
        })
        .await;

        signal_task.abort();

        // 5. Shutdown samplers regardless of how the loop ended
        let shutdown = shutdown_samplers(group, join_timeout).await?;

        let (agg, mut renderers, stop_reason) = match loop_result {
            Ok(parts) => parts,
            Err(e) => return Err(anyhow!(e).context("Aggregator loop failed")),
        };

        if let Err(e) = renderers.close() {
            warn!(error = %e, "Error while closing renderers");
        }

        let stats = PipelineStats {
            run: agg.into_stats(),
            stop_reason,
            renderers: renderers.counts(),
            shutdown,
            duration: start_time.elapsed(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Stop, join (bounded per sampler) and release, off the async runtime
async fn shutdown_samplers(group: SamplerGroup, join_timeout: Duration) -> Result<ShutdownReport> {
    info!(samplers = group.len(), "Shutting down samplers...");

    let report = tokio::task::spawn_blocking(move || group.shutdown(join_timeout))
        .await
        .context("Sampler shutdown task failed")?;

    observability::record_shutdown(
        report.joined.len(),
        report.timed_out.len(),
        report.unreleased.len(),
    );

    if !report.is_clean() {
        error!(
            timed_out = ?report.timed_out,
            unreleased = ?report.unreleased,
            "Shutdown incomplete: samplers did not exit in time"
        );
    }
    for failed in report.failed() {
        warn!(sensor_id = %failed.sensor_id, exit = ?failed.exit, "Sampler ended before shutdown");
    }

    Ok(report)
}

/// Wait for Ctrl+C or SIGTERM, then raise the quit flag
async fn watch_shutdown_signal(quit: QuitSignal) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping pipeline...");
    quit.request();
}
