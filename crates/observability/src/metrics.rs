//! 指标描述与运行级记录辅助函数
//!
//! 热路径指标在产生处直接上报（采样器、聚合器、
//! 渲染器）；本模块为导出器注册说明，并记录
//! 每次运行一次的数值。

use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};

/// 为管线上报的每个指标注册帮助文本
pub fn describe_metrics() {
    describe_counter!(
        "sensor_display_samples_total",
        Unit::Count,
        "Samples produced per source"
    );
    describe_counter!(
        "sensor_display_samples_overwritten_total",
        Unit::Count,
        "Samples replaced in the channel before the aggregator took them"
    );
    describe_counter!(
        "sensor_display_transient_failures_total",
        Unit::Count,
        "Failed sample attempts that were retried"
    );
    describe_counter!(
        "sensor_display_sampler_exits_total",
        Unit::Count,
        "Sampler thread exits by reason"
    );
    describe_counter!(
        "sensor_display_ticks_total",
        Unit::Count,
        "Composites produced by the aggregator"
    );
    describe_counter!(
        "sensor_display_extrapolated_total",
        Unit::Count,
        "Counter values displayed from an estimate"
    );
    describe_gauge!(
        "sensor_display_source_age_seconds",
        Unit::Seconds,
        "Age of the last known sample per source"
    );
    describe_counter!(
        "sensor_display_render_failures_total",
        Unit::Count,
        "Failed render calls per renderer"
    );
    describe_counter!(
        "sensor_display_join_timeouts_total",
        Unit::Count,
        "Samplers that did not exit within the join timeout"
    );
    describe_gauge!(
        "sensor_display_sources_active",
        Unit::Count,
        "Sampler threads currently running"
    );
    describe_gauge!(
        "sensor_display_sources_unreleased",
        Unit::Count,
        "Sources whose device was still held after shutdown"
    );
}

/// 记录运行中的采样线程数
pub fn record_sources_active(count: usize) {
    gauge!("sensor_display_sources_active").set(count as f64);
}

/// 记录一次关闭的结果
pub fn record_shutdown(joined: usize, timed_out: usize, unreleased: usize) {
    gauge!("sensor_display_sources_active").set(timed_out as f64);
    gauge!("sensor_display_sources_unreleased").set(unreleased as f64);
    counter!("sensor_display_shutdowns_total", "clean" => (timed_out == 0).to_string())
        .increment(1);
    tracing::debug!(joined, timed_out, unreleased, "shutdown metrics recorded");
}
