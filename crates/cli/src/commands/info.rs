//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DisplayBlueprint, SensorKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    display: DisplayInfo,
    sources: Vec<SourceInfo>,
    renderers: Vec<RendererInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_log: Option<String>,
}

#[derive(Serialize)]
struct DisplayInfo {
    frequency_hz: f64,
    tick_interval_ms: f64,
    join_timeout_ms: u64,
}

#[derive(Serialize)]
struct SourceInfo {
    id: String,
    kind: SensorKind,
    /// Staleness handling between fresh samples
    staleness: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
}

#[derive(Serialize)]
struct RendererInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "Loading configuration info");

    let blueprint = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Built-in default configuration is invalid".to_string(),
        })?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &DisplayBlueprint) -> ConfigInfo {
    let camera = blueprint.camera.iter().map(|c| SourceInfo {
        id: c.id.clone(),
        kind: SensorKind::Camera,
        staleness: "hold",
        period_ms: None,
        device: Some(c.device.clone()),
        resolution: Some(format!("{}x{}", c.width, c.height)),
    });

    let counters = blueprint.counters.iter().map(|c| SourceInfo {
        id: c.id.clone(),
        kind: SensorKind::Counter,
        staleness: "extrapolate",
        period_ms: Some(c.period_ms),
        device: None,
        resolution: None,
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        display: DisplayInfo {
            frequency_hz: blueprint.display.frequency_hz,
            tick_interval_ms: blueprint
                .display
                .tick_interval()
                .map_or(0.0, |tick| tick.as_secs_f64() * 1000.0),
            join_timeout_ms: blueprint.display.join_timeout_ms,
        },
        sources: camera.chain(counters).collect(),
        renderers: blueprint
            .renderers
            .iter()
            .map(|r| RendererInfo {
                name: r.name.clone(),
                kind: format!("{:?}", r.kind),
                params: r.params.clone(),
            })
            .collect(),
        error_log: blueprint
            .logging
            .error_log
            .as_ref()
            .map(|p| p.display().to_string()),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Sensor Display Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🖥  Display");
    println!("   ├─ Version: {}", info.version);
    println!(
        "   ├─ Frequency: {} Hz ({:.2} ms/tick)",
        info.display.frequency_hz, info.display.tick_interval_ms
    );
    println!("   └─ Join timeout: {} ms", info.display.join_timeout_ms);

    println!("\n📡 Sources ({})", info.sources.len());
    for (i, source) in info.sources.iter().enumerate() {
        let prefix = if i == info.sources.len() - 1 { "└─" } else { "├─" };
        match source.kind {
            SensorKind::Camera => println!(
                "   {} {} (camera {} @ {}, {})",
                prefix,
                source.id,
                source.device.as_deref().unwrap_or("-"),
                source.resolution.as_deref().unwrap_or("-"),
                source.staleness
            ),
            SensorKind::Counter => println!(
                "   {} {} (counter every {} ms, {})",
                prefix,
                source.id,
                source.period_ms.unwrap_or_default(),
                source.staleness
            ),
        }
    }

    if !info.renderers.is_empty() {
        println!("\n📤 Renderers ({})", info.renderers.len());
        for (i, renderer) in info.renderers.iter().enumerate() {
            let prefix = if i == info.renderers.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({})", prefix, renderer.name, renderer.kind);
        }
    }

    if let Some(ref path) = info.error_log {
        println!("\n📝 Error log: {}", path);
    }

    println!();
}
