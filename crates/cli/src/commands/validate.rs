//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::DisplayBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Outcome of checking one config file, also the `--json` payload
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

impl ValidationResult {
    fn invalid(config_path: String, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error.into()),
            warnings: Vec::new(),
            summary: None,
        }
    }

    fn accepted(config_path: String, blueprint: &DisplayBlueprint) -> Self {
        Self {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(blueprint),
            summary: Some(ConfigSummary::from(blueprint)),
        }
    }
}

#[derive(Serialize)]
struct ConfigSummary {
    frequency_hz: f64,
    join_timeout_ms: u64,
    sources: Vec<String>,
    renderers: Vec<String>,
}

impl From<&DisplayBlueprint> for ConfigSummary {
    fn from(blueprint: &DisplayBlueprint) -> Self {
        Self {
            frequency_hz: blueprint.display.frequency_hz,
            join_timeout_ms: blueprint.display.join_timeout_ms,
            sources: blueprint.source_ids().into_iter().map(String::from).collect(),
            renderers: blueprint.renderers.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

/// Execute the `validate` command; invalid config is an error exit
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);
    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    anyhow::ensure!(result.valid, "Configuration validation failed");
    Ok(())
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    if !args.config.is_file() {
        let error = format!("File not found: {config_path}");
        return ValidationResult::invalid(config_path, error);
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => ValidationResult::accepted(config_path, &blueprint),
        Err(e) => ValidationResult::invalid(config_path, e.to_string()),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &DisplayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.renderers.is_empty() {
        warnings.push("No renderers configured - composites will be discarded".to_string());
    }

    if blueprint.camera.is_none() && blueprint.counters.is_empty() {
        warnings.push("No sources configured - every composite will be empty".to_string());
    }

    let tick = blueprint.display.tick_interval().unwrap_or_default();
    for counter in &blueprint.counters {
        if counter.period() > tick.saturating_mul(10) {
            warnings.push(format!(
                "Counter '{}' updates every {} ms; most ticks will show an extrapolated value",
                counter.id, counter.period_ms
            ));
        }
    }

    if let Some(camera) = &blueprint.camera {
        if camera.frame_rate_hz < blueprint.display.frequency_hz {
            warnings.push(format!(
                "Camera '{}' runs at {} Hz, below the {} Hz display rate - frames will repeat",
                camera.id, camera.frame_rate_hz, blueprint.display.frequency_hz
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    let Some(summary) = result.summary.as_ref().filter(|_| result.valid) else {
        println!("✗ {}: invalid", result.config_path);
        if let Some(error) = &result.error {
            println!("    {error}");
        }
        return;
    };

    println!("✓ {}: ok", result.config_path);
    println!(
        "    {} Hz, join timeout {} ms",
        summary.frequency_hz, summary.join_timeout_ms
    );
    println!("    sources:   {}", summary.sources.join(", "));
    println!("    renderers: {}", summary.renderers.join(", "));

    for warning in &result.warnings {
        println!("  ⚠ {warning}");
    }
}
