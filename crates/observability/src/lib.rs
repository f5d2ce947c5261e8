//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//! - Tracing 初始化 (JSON / Pretty / Compact 控制台输出)
//! - 错误日志文件：ERROR 事件以 `timestamp - level - message` 追加写入
//! - Prometheus 指标导出
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = observability::ObservabilityConfig {
//!     error_log: Some("log/sensor_errors.log".into()),
//!     ..Default::default()
//! };
//! observability::init_with_config(config)?;
//! ```

mod error_log;
pub mod metrics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub use crate::error_log::{error_file_layer, open_error_log, ErrorLineFormat, TIMESTAMP_FORMAT};
pub use crate::metrics::{describe_metrics, record_shutdown, record_sources_active};

/// 使用默认配置初始化（JSON 日志，无导出器，无错误文件）
pub fn init() -> Result<LogGuard> {
    init_with_config(ObservabilityConfig::default())
}

/// 保持后台日志写线程运行；drop 时刷新
#[must_use = "dropping the guard stops the error log writer"]
#[derive(Debug, Default)]
pub struct LogGuard {
    _error_log: Option<WorkerGuard>,
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 控制台日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 未设置 `RUST_LOG` 时的默认过滤指令
    pub default_log_level: String,
    /// 忽略 `RUST_LOG`，直接使用 `default_log_level`
    pub ignore_env_filter: bool,
    /// 仅 ERROR 的追加日志 (None = 禁用)
    pub error_log: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            ignore_env_filter: false,
            error_log: None,
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<LogGuard> {
    // 1. 控制台层，按 RUST_LOG / 默认级别过滤
    let filter = if config.ignore_env_filter {
        EnvFilter::new(&config.default_log_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_log_level))
    };

    let console: BoxedLayer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_filter(filter).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_filter(filter).boxed(),
    };

    let mut layers = vec![console];
    let mut guard = LogGuard::default();

    // 2. 错误文件层，与控制台过滤器相互独立
    if let Some(path) = &config.error_log {
        let (layer, writer_guard) = error_file_layer::<Registry>(path)?;
        layers.push(layer.boxed());
        guard._error_log = Some(writer_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 3. Prometheus 导出器（如启用）
    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        error_log = ?config.error_log,
        "Observability initialized"
    );

    Ok(guard)
}

/// 仅安装 Prometheus 导出器
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    describe_metrics();
    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
