use std::time::Duration;

use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_ANNOTATION_KEY, DEFAULT_LABEL_SELECTOR, DEFAULT_LISTEN_ADDRESS, DEFAULT_METRICS_PATH,
    DEFAULT_POLLING_INTERVAL_SECS,
};
use crate::utils::duration;

/// ================================
/// Full exporter configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// listen address of the scrape endpoint, `:PORT` binds all interfaces
    #[serde(default = "default_address")]
    pub address: String,
    /// empty list selects every secret of every namespace
    #[serde(default = "default_label_selectors")]
    pub label_selectors: Vec<String>,
    #[serde(default = "default_polling_interval", deserialize_with = "duration::deserialize")]
    pub polling_interval: Duration,
    /// empty path means in-cluster service account credentials
    #[serde(default)]
    pub kubeconfig_path: String,
    #[serde(default = "default_annotation_key")]
    pub annotation_key: String,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default)]
    pub publish_mode: PublishMode,
    #[serde(default = "default_process_metrics")]
    pub process_metrics: bool,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            label_selectors: default_label_selectors(),
            polling_interval: default_polling_interval(),
            kubeconfig_path: String::new(),
            annotation_key: default_annotation_key(),
            metrics_path: default_metrics_path(),
            publish_mode: PublishMode::default(),
            process_metrics: default_process_metrics(),
            logging: None,
        }
    }
}

/// How a poll cycle's samples become visible to scrapers.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// gauges are reset at cycle start and filled secret by secret
    #[default]
    Incremental,
    /// samples are staged and swapped in at cycle end under the publish lock
    Snapshot,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // allowed: trace, debug, info, warn, error
    #[serde(default = "LogFormat::from_env")]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

fn default_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_label_selectors() -> Vec<String> {
    vec![DEFAULT_LABEL_SELECTOR.to_string()]
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS)
}

fn default_annotation_key() -> String {
    DEFAULT_ANNOTATION_KEY.to_string()
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_process_metrics() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
