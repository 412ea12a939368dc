//! Console + file logging.
//!
//! The file layer writes `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` at the
//! configured UTC offset; this is the file `GET /api/logs` serves.

use capa_core::config::{shellexpand, BotConfig};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Wall-clock time at a fixed offset from UTC.
pub fn local_now(offset_hours: i32) -> NaiveDateTime {
    (Utc::now() + Duration::hours(i64::from(offset_hours))).naive_utc()
}

/// Today's date at a fixed offset from UTC.
pub fn local_today(offset_hours: i32) -> NaiveDate {
    local_now(offset_hours).date()
}

pub fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Event format for the log file.
pub struct FileFormat {
    pub offset_hours: i32,
}

impl<S, N> FormatEvent<S, N> for FileFormat
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
        let ts = local_now(self.offset_hours).format("%Y-%m-%d %H:%M:%S");
        write!(writer, "[{ts}] [{}] ", level_label(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the console and file layers. Keep the guard alive for the
/// lifetime of the process or buffered lines are lost.
pub fn init(config: &BotConfig) -> anyhow::Result<WorkerGuard> {
    let path = shellexpand(&config.log_file);
    let path = Path::new(&path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("bot.log_file has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(FileFormat {
                    offset_hours: config.utc_offset_hours,
                })
                .with_writer(writer),
        )
        .try_init()?;

    Ok(guard)
}
