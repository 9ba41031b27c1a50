//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks the listen address, metrics path, polling interval,
//!   annotation key and label selectors

use tracing::{error, info, warn};

use crate::config::settings::ExporterConfig;
use crate::server::server::normalize_listen_address;
use crate::utils::constants::HEALTH_PATH;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_exporter_config(cfg: &ExporterConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_address(&cfg.address, &mut errors);
    validate_metrics_path(&cfg.metrics_path, &mut errors);

    if cfg.polling_interval.is_zero() {
        errors.push("polling_interval must be greater than zero".to_string());
    }

    if cfg.annotation_key.trim().is_empty() {
        errors.push("annotation_key must not be empty".to_string());
    }

    for (idx, selector) in cfg.label_selectors.iter().enumerate() {
        if selector.trim().is_empty() {
            errors.push(format!("label_selectors[{}] must not be blank", idx));
        }
    }
    if cfg.label_selectors.is_empty() {
        warn!("label_selectors is empty; every secret of every namespace will be scanned");
    }

    if let Some(logging) = &cfg.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
        // format validated by serde enum
    }

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config error: {}", e);
        }
        Err(errors)
    }
}

fn validate_address(address: &str, errors: &mut Vec<String>) {
    let normalized = normalize_listen_address(address);
    match normalized.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                errors.push(format!("address '{}' has an empty host", address));
            }
            if port.parse::<u16>().is_err() {
                errors.push(format!("address '{}' has an invalid port '{}'", address, port));
            }
        }
        None => errors.push(format!("address '{}' must be in 'host:port' or ':port' form", address)),
    }
}

fn validate_metrics_path(path: &str, errors: &mut Vec<String>) {
    if !path.starts_with('/') {
        errors.push(format!("metrics_path '{}' must start with '/'", path));
    } else if path.len() == 1 {
        errors.push("metrics_path must not be the root path".to_string());
    } else if path == HEALTH_PATH {
        errors.push(format!("metrics_path '{}' is reserved for the health check", path));
    } else if path.contains([':', '{', '}']) {
        errors.push(format!("metrics_path '{}' must not contain ':', '{{' or '}}'", path));
    }
}
