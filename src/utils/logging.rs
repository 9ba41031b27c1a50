use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::{LogFormat, LoggingConfig};

/// HTTP plumbing is only interesting when something breaks.
const QUIET_DEPENDENCIES: [&str; 4] = ["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Resolve the effective logging config: the CLI level wins over the file level.
pub fn resolve(logging: Option<&LoggingConfig>, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let format = logging
        .map(|config| config.format.to_owned())
        .unwrap_or_else(LogFormat::from_env);
    let level = arg_log_level
        .map(|level| level.as_str().to_owned())
        .or_else(|| logging.map(|config| config.level.to_lowercase()))
        .unwrap_or_else(|| LogLevel::Info.as_str().to_owned());

    LoggingConfig::new(level, format)
}

pub fn run(logging: Option<&LoggingConfig>, arg_log_level: Option<LogLevel>) {
    init_logging(&resolve(logging, arg_log_level));
}

/// `RUST_LOG`, when set, replaces the computed filter entirely.
pub fn env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directives = std::iter::once(level)
        .chain(QUIET_DEPENDENCIES)
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(LogLevel::Info.as_str()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(cfg: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(&cfg.level));

    let installed = match cfg.format {
        // flattened, colourless lines for container log collectors
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_ansi(false),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_timer(UtcTime::rfc_3339())
                    .with_target(false)
                    .with_ansi(true),
            )
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(level = %cfg.level, format = ?cfg.format, "logging initialized");
    }
}
