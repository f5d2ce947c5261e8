//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sensor Display - multi-rate sensor sampling with a fixed-rate composite view
#[derive(Parser, Debug)]
#[command(
    name = "sensor-display",
    author,
    version,
    about = "Multi-rate sensor sampling and latest-value compositing",
    long_about = "Samples a camera and several periodic counters on their own threads,\n\
                  composites the latest value of each at a fixed display rate, and\n\
                  hands every composite to the configured renderers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SENSOR_DISPLAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "SENSOR_DISPLAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sampling and display pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults if omitted
    #[arg(short, long, env = "SENSOR_DISPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Camera device (`/dev/videoN`, `synthetic[:N]`, or an image directory)
    #[arg(long, env = "SENSOR_DISPLAY_CAMERA")]
    pub camera: Option<String>,

    /// Camera resolution, e.g. `1280x720`
    #[arg(long, value_parser = parse_resolution_arg, env = "SENSOR_DISPLAY_RESOLUTION")]
    pub resolution: Option<(u32, u32)>,

    /// Display frequency in Hz
    #[arg(long, env = "SENSOR_DISPLAY_FREQUENCY")]
    pub frequency: Option<f64>,

    /// Per-sampler join timeout at shutdown, in milliseconds
    #[arg(long, env = "SENSOR_DISPLAY_JOIN_TIMEOUT_MS")]
    pub join_timeout_ms: Option<u64>,

    /// Stop after this many composites (0 = unlimited)
    #[arg(long, default_value = "0", env = "SENSOR_DISPLAY_MAX_TICKS")]
    pub max_ticks: u64,

    /// Write composites (PNG + overlay JSON) under this directory
    #[arg(short, long, env = "SENSOR_DISPLAY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SENSOR_DISPLAY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Append ERROR events to this file
    #[arg(long, env = "SENSOR_DISPLAY_ERROR_LOG")]
    pub error_log: Option<PathBuf>,

    /// Resolve and validate configuration, then exit
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Overrides carried by the flags
    pub fn overrides(&self) -> config_loader::ConfigOverrides {
        config_loader::ConfigOverrides {
            camera: self.camera.clone(),
            resolution: self.resolution,
            frequency_hz: self.frequency,
            join_timeout_ms: self.join_timeout_ms,
            error_log: self.error_log.clone(),
            output_dir: self.output.clone(),
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults if omitted
    #[arg(short, long, env = "SENSOR_DISPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_resolution_arg(s: &str) -> Result<(u32, u32), String> {
    config_loader::parse_resolution(s).map_err(|e| e.to_string())
}
