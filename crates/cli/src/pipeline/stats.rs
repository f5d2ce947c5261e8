//! 管线统计。

use std::time::Duration;

use aggregator::{RunStats, StopReason};
use render::RendererCounts;
use sampler::{SamplerExit, ShutdownReport};

/// 管线运行统计
#[derive(Debug)]
pub struct PipelineStats {
    /// 聚合器计数
    pub run: RunStats,

    /// tick 循环结束原因
    pub stop_reason: StopReason,

    /// 采样线程关闭结果
    pub shutdown: ShutdownReport,

    /// 各渲染器的结果计数
    pub renderers: Vec<(String, RendererCounts)>,

    /// 管线运行总时长
    pub duration: Duration,
}

impl PipelineStats {
    /// 每秒合成数
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.run.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// 所有采样线程均在超时内 join
    pub fn clean_shutdown(&self) -> bool {
        self.shutdown.is_clean()
    }

    /// 打印详细摘要
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stop reason: {:?}", self.stop_reason);
        println!("   ├─ Ticks: {}", self.run.ticks);
        println!("   ├─ Frames composed: {}", self.run.frames_composed);
        println!("   ├─ Skipped ticks: {}", self.run.skipped_ticks);
        println!("   └─ FPS: {:.2}", self.fps());

        println!("\nSources");
        for (id, source) in &self.run.sources {
            let last = source
                .last_value
                .map(|v| format!(", last={v}"))
                .unwrap_or_default();
            println!(
                "   ├─ {}: samples={}, stale={}, extrapolated={}{}{}",
                id,
                source.samples_taken,
                source.stale_ticks,
                source.extrapolated_ticks,
                last,
                if source.disconnected { " (disconnected)" } else { "" }
            );
        }

        println!("\nSamplers");
        for report in &self.shutdown.joined {
            let exit = match &report.exit {
                SamplerExit::Stopped => "stopped".to_string(),
                SamplerExit::Failed(e) => format!("failed: {e}"),
                SamplerExit::Panicked(e) => format!("panicked: {e}"),
            };
            println!(
                "   ├─ {}: samples={}, transient_failures={}, {}",
                report.sensor_id, report.samples, report.transient_failures, exit
            );
        }
        for id in &self.shutdown.timed_out {
            let released = if self.shutdown.unreleased.contains(id) {
                "resources still held"
            } else {
                "resources released"
            };
            println!("   ├─ {}: join timed out, {}", id, released);
        }
        println!("   └─ Shutdown took {:.3}s", self.shutdown.elapsed.as_secs_f64());

        if !self.renderers.is_empty() {
            println!("\nRenderers");
            for (name, counts) in &self.renderers {
                println!(
                    "   ├─ {}: rendered={}, failed={}",
                    name, counts.rendered, counts.failed
                );
            }
        }

        println!();
    }
}
