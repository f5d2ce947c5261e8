//! Error log file layer
//!
//! Appends every ERROR event to a plain text file, one line per event:
//! `YYYY-MM-DD HH:MM:SS,mmm - ERROR - message key=value ...`
//!
//! Lines are handed to a background writer thread, so logging threads never
//! block on file I/O. Pending lines are flushed when the returned
//! [`WorkerGuard`] is dropped.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Local-time stamp with millisecond precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `timestamp - LEVEL - message` line format
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLineFormat;

impl<S, N> FormatEvent<S, N> for ErrorLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now();
        write!(
            writer,
            "{} - {} - ",
            now.format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Open `path` for appending, creating missing parent directories
pub fn open_error_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open error log {}", path.display()))
}

/// ERROR-only layer appending to `path`; keep the guard alive until exit
pub fn error_file_layer<S>(
    path: &Path,
) -> Result<(impl Layer<S> + Send + Sync + 'static, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file = open_error_log(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(ErrorLineFormat)
        .with_writer(writer)
        .with_filter(LevelFilter::ERROR);
    Ok((layer, guard))
}
