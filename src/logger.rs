//! `log` backend printing syslog-style lines (`bme280d[pid]: LEVEL: message`) to stderr.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Environment variable selecting the log level (`error`, `warn`, `info`, `debug`, `trace`
/// or `off`).
pub const LOG_ENV: &str = "BME280D_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", format_record(record));
        }
    }

    fn flush(&self) {}
}

fn format_record(record: &Record) -> String {
    format!(
        "{}[{}]: {}: {}",
        env!("CARGO_PKG_NAME"),
        std::process::id(),
        record.level(),
        record.args()
    )
}

/// Level for a value of [`LOG_ENV`]; unset or unparsable values give `info`.
pub fn level_from_env(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

pub fn init_with_level(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Installs the logger with the level taken from [`LOG_ENV`].
pub fn init() -> Result<(), SetLoggerError> {
    init_with_level(level_from_env(std::env::var(LOG_ENV).ok().as_deref()))
}
