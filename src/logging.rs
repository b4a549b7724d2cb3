use std::fs;

use time::UtcOffset;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

const ENV_FILTER_FILE: &str = "logging.env";

/// Keeps the background log writers alive. Dropping this flushes them.
pub struct LoggingHandle {
    _stdout_guard: WorkerGuard,
    _file_guard: WorkerGuard,
}

/// Logs to stdout at `console_level` (or whatever `logging.env` says) and
/// everything from debug up to a daily log file.
pub fn init_logging(console_level: Level, config: &LoggingConfig) -> Result<LoggingHandle, String> {
    // Must happen before any other threads exist.
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or_else(|err| {
            eprintln!("Failed to get timezone: {}", err);
            UtcOffset::UTC
        }),
        time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] +[offset_hour]"
        ),
    );

    let env_filter = read_env_filter(console_level).unwrap_or_else(|err| {
        if cfg!(debug_assertions) {
            eprintln!("{}, using environment variable or default", err);
        }
        EnvFilter::builder()
            .with_default_directive(console_level.into())
            .from_env_lossy()
    });

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily(config.get_directory(), config.get_file_prefix());
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_timer(timer.clone())
        .with_writer(stdout_writer)
        .with_filter(env_filter);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_timer(timer)
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(LevelFilter::DEBUG);

    let subscriber = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| format!("failed to initialize logger: {}", err))?;
    tracing_log::LogTracer::init()
        .map_err(|err| format!("failed to forward log records: {}", err))?;

    Ok(LoggingHandle {
        _stdout_guard: stdout_guard,
        _file_guard: file_guard,
    })
}

fn read_env_filter(default_level: Level) -> Result<EnvFilter, String> {
    let s = fs::read_to_string(ENV_FILTER_FILE)
        .map_err(|err| format!("Failed to read {} file: {}", ENV_FILTER_FILE, err))?;
    let first_line = s.lines().next().unwrap_or_default();
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse(first_line)
        .map_err(|err| format!("Failed to parse env filter: {}", err))
}
