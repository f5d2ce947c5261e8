//! `run` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use contracts::DisplayBlueprint;
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Resolved configuration and the logging sinks derived from it
pub struct PreparedRun {
    pub blueprint: Result<DisplayBlueprint>,
    pub error_log: Option<PathBuf>,
    pub metrics_port: Option<u16>,
}

/// Resolve the configuration before logging starts.
///
/// A config that fails to load still yields the `--error-log` flag, so the
/// failure itself reaches the error log.
pub fn prepare_run(args: &RunArgs) -> PreparedRun {
    let blueprint = resolve_blueprint(args);
    let error_log = match &blueprint {
        Ok(blueprint) => blueprint.logging.error_log.clone(),
        Err(_) => args.error_log.clone(),
    };
    PreparedRun {
        blueprint,
        error_log,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    }
}

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs, prepared: PreparedRun) -> Result<()> {
    let blueprint = prepared.blueprint?;

    info!(
        config = ?args.config,
        camera = ?blueprint.camera.as_ref().map(|c| c.device.as_str()),
        counters = blueprint.counters.len(),
        renderers = blueprint.renderers.len(),
        frequency_hz = blueprint.display.frequency_hz,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_ticks: (args.max_ticks != 0).then_some(args.max_ticks),
    });

    info!("Starting pipeline...");
    let stats = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        ticks = stats.run.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        stop_reason = ?stats.stop_reason,
        clean_shutdown = stats.clean_shutdown(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Sensor Display finished");
    Ok(())
}

/// Load configuration (or defaults) and apply flag overrides
fn resolve_blueprint(args: &RunArgs) -> Result<DisplayBlueprint> {
    let mut blueprint = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Built-in default configuration is invalid".to_string(),
        })?;

    let overrides = args.overrides();
    if !overrides.is_empty() {
        overrides
            .apply(&mut blueprint)
            .context("Command-line overrides produce an invalid configuration")?;
    }

    Ok(blueprint)
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &DisplayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Display:");
    println!("  Frequency: {} Hz", blueprint.display.frequency_hz);
    println!("  Join timeout: {} ms", blueprint.display.join_timeout_ms);

    match &blueprint.camera {
        Some(camera) => println!(
            "\nCamera: {} ({}x{} @ {} Hz) from {}",
            camera.id, camera.width, camera.height, camera.frame_rate_hz, camera.device
        ),
        None => println!("\nCamera: none"),
    }

    println!("\nCounters ({}):", blueprint.counters.len());
    for counter in &blueprint.counters {
        println!("  - {} every {} ms", counter.id, counter.period_ms);
    }

    if !blueprint.renderers.is_empty() {
        println!("\nRenderers ({}):", blueprint.renderers.len());
        for renderer in &blueprint.renderers {
            println!("  - {} ({:?})", renderer.name, renderer.kind);
        }
    }

    println!();
}
