//! DisplayBlueprint - config_loader 的输出
//!
//! 描述完整管线：显示节拍、相机、周期计数器、
//! 渲染器以及错误日志。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::error::ContractError;

/// 显示与相机允许的最低频率 (Hz)
pub const MIN_RATE_HZ: f64 = 0.001;

/// 每个采样线程 join 超时的上限 (ms)
pub const MAX_JOIN_TIMEOUT_MS: u64 = 600_000;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整管线蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisplayBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 聚合器 / 显示配置
    #[serde(default)]
    #[validate(nested)]
    pub display: DisplayConfig,

    /// 帧源 (`None` 表示只运行计数器)
    #[serde(default = "default_camera")]
    #[validate(nested)]
    pub camera: Option<CameraConfig>,

    /// 周期计数器源，按叠加层顺序排列
    #[serde(default = "default_counters")]
    #[validate(nested)]
    pub counters: Vec<CounterConfig>,

    /// 输出渲染器
    #[serde(default = "default_renderers")]
    #[validate(nested)]
    pub renderers: Vec<RendererConfig>,

    /// 日志输出
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DisplayBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            display: DisplayConfig::default(),
            camera: default_camera(),
            counters: default_counters(),
            renderers: default_renderers(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DisplayBlueprint {
    /// 按构建顺序返回源 ID（相机在前）
    pub fn source_ids(&self) -> Vec<&str> {
        self.camera
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.counters.iter().map(|c| c.id.as_str()))
            .collect()
    }

    /// 源总数
    pub fn source_count(&self) -> usize {
        self.counters.len() + usize::from(self.camera.is_some())
    }
}

/// 聚合器 / 显示配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisplayConfig {
    /// 合成输出频率 (Hz)
    #[serde(default = "default_frequency_hz")]
    #[validate(range(min = MIN_RATE_HZ, max = 1000.0))]
    pub frequency_hz: f64,

    /// 关闭时等待每个采样线程的硬上限 (ms)
    #[serde(default = "default_join_timeout_ms")]
    #[validate(range(min = 1, max = MAX_JOIN_TIMEOUT_MS))]
    pub join_timeout_ms: u64,

    /// 传给渲染器的窗口标题
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
            join_timeout_ms: default_join_timeout_ms(),
            window_title: default_window_title(),
        }
    }
}

impl DisplayConfig {
    /// 两次 tick 之间的时间间隔
    pub fn tick_interval(&self) -> Result<Duration, ContractError> {
        interval_from_hz("display.frequency_hz", self.frequency_hz)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// 频率 (Hz) 对应的周期；`field` 为出错的配置项
pub fn interval_from_hz(field: &str, hz: f64) -> Result<Duration, ContractError> {
    if !(hz.is_finite() && hz > 0.0) {
        return Err(ContractError::config_validation(
            field,
            format!("rate must be a positive number, got {hz}"),
        ));
    }
    Duration::try_from_secs_f64(1.0 / hz).map_err(|e| {
        ContractError::config_validation(field, format!("rate {hz} Hz has no usable period: {e}"))
    })
}

fn default_frequency_hz() -> f64 {
    30.0
}

fn default_join_timeout_ms() -> u64 {
    1000
}

fn default_window_title() -> String {
    "Sensor Display".to_string()
}

/// 相机配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CameraConfig {
    /// 唯一源标识
    #[serde(default = "default_camera_id")]
    #[validate(length(min = 1))]
    pub id: String,

    /// 设备描述：`/dev/videoN`、`synthetic[:N]` 或图像目录
    #[serde(default = "default_device")]
    #[validate(length(min = 1))]
    pub device: String,

    /// 请求的帧宽 (px)
    #[serde(default = "default_width")]
    #[validate(range(min = 1, max = 16384))]
    pub width: u32,

    /// 请求的帧高 (px)
    #[serde(default = "default_height")]
    #[validate(range(min = 1, max = 16384))]
    pub height: u32,

    /// 设备帧率 (Hz)；控制合成与图像序列设备的节奏
    #[serde(default = "default_camera_fps")]
    #[validate(range(min = MIN_RATE_HZ, max = 1000.0))]
    pub frame_rate_hz: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            id: default_camera_id(),
            device: default_device(),
            width: default_width(),
            height: default_height(),
            frame_rate_hz: default_camera_fps(),
        }
    }
}

impl CameraConfig {
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 两帧之间的间隔
    pub fn frame_interval(&self) -> Result<Duration, ContractError> {
        interval_from_hz("camera.frame_rate_hz", self.frame_rate_hz)
    }
}

fn default_camera() -> Option<CameraConfig> {
    Some(CameraConfig::default())
}

fn default_camera_id() -> String {
    "camera".to_string()
}

fn default_device() -> String {
    "synthetic".to_string()
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_camera_fps() -> f64 {
    30.0
}

/// 周期计数器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CounterConfig {
    /// 唯一源标识（同时作为叠加层标签）
    #[validate(length(min = 1))]
    pub id: String,

    /// 标称周期 (ms)，必须 > 0
    #[validate(range(min = 1))]
    pub period_ms: u64,
}

impl CounterConfig {
    pub fn new(id: impl Into<String>, period_ms: u64) -> Self {
        Self {
            id: id.into(),
            period_ms,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

fn default_counters() -> Vec<CounterConfig> {
    vec![
        CounterConfig::new("sensor0", 10),
        CounterConfig::new("sensor1", 100),
        CounterConfig::new("sensor2", 1000),
    ]
}

/// 渲染器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RendererConfig {
    /// 渲染器名称
    #[validate(length(min = 1))]
    pub name: String,

    /// 渲染器类型
    pub kind: RendererKind,

    /// 类型相关参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// 渲染器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// 通过 tracing 输出摘要行
    Log,
    /// PNG 帧 + JSON 叠加层写入磁盘
    File,
}

fn default_renderers() -> Vec<RendererConfig> {
    vec![RendererConfig {
        name: "log".to_string(),
        kind: RendererKind::Log,
        params: HashMap::new(),
    }]
}

/// 日志输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 仅追加的错误日志（`None` 关闭文件输出）
    #[serde(default = "default_error_log")]
    pub error_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            error_log: default_error_log(),
        }
    }
}

fn default_error_log() -> Option<PathBuf> {
    Some(PathBuf::from("log/sensor_errors.log"))
}
