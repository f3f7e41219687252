//! Log sink setup.
//!
//! Everything in the crate logs through `tracing`. The binary installs one
//! subscriber at startup: a text `fmt` layer writing either to stdout or,
//! when a log path is given, to that file through a non-blocking appender.
//!
//! Lines look like `[2024.01.18 12:00:00] I Processing /data/a.tsv.gz`.
//! `RUST_LOG` directives are honoured on top of the configured level.
//!
//! ```no_run
//! use memc_loader::logging::{LogConfig, init_logging};
//! use tracing::Level;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = LogConfig::builder().level(Level::DEBUG).build();
//! let _guard = init_logging(&config)?;
//! tracing::info!("started");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level to emit.
    pub level: Level,
    /// Log file; stdout when `None`.
    pub file: Option<PathBuf>,
    /// Extra filter directives, e.g. `"memc_loader::parser=warn"`.
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
            filter_directives: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }
}

/// Builder for [`LogConfig`].
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    #[must_use]
    pub fn file(mut self, file: Option<PathBuf>) -> Self {
        self.config.file = file;
        self
    }

    #[must_use]
    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    #[must_use]
    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// `[timestamp] L message` formatter.
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
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
        let now = chrono::Local::now().format(TIMESTAMP_FORMAT);
        write!(writer, "[{now}] {} ", level_letter(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_letter(level: Level) -> char {
    match level {
        Level::TRACE => 'T',
        Level::DEBUG => 'D',
        Level::INFO => 'I',
        Level::WARN => 'W',
        _ => 'E',
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive until
/// exit so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid, the log file cannot be
/// opened, or a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();
    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',') {
            filter = filter.add_directive(
                directive
                    .parse()
                    .with_context(|| format!("parse filter directive `{directive}`"))?,
            );
        }
    }

    match &config.file {
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stdout)
                        .event_format(LineFormat),
                )
                .try_init()
                .context("install log subscriber")?;
            Ok(None)
        }
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .event_format(LineFormat),
                )
                .try_init()
                .context("install log subscriber")?;
            Ok(Some(guard))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_levels() {
        assert_eq!(level_letter(Level::INFO), 'I');
        assert_eq!(level_letter(Level::ERROR), 'E');
        assert_eq!(level_letter(Level::DEBUG), 'D');
    }

    #[test]
    fn timestamp_layout() {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 1, 18)
            .and_then(|d| d.and_hms_opt(9, 5, 3))
            .unwrap();
        assert_eq!(t.format(TIMESTAMP_FORMAT).to_string(), "2024.01.18 09:05:03");
    }

    #[test]
    fn builder_sets_fields() {
        let c = LogConfig::builder()
            .level(Level::DEBUG)
            .file(Some(PathBuf::from("/var/log/memc.log")))
            .filter_directives("memc_loader=trace")
            .build();
        assert_eq!(c.level, Level::DEBUG);
        assert_eq!(c.file.as_deref(), Some(std::path::Path::new("/var/log/memc.log")));
        assert_eq!(c.filter_directives.as_deref(), Some("memc_loader=trace"));
    }
}
