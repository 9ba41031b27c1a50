use std::{fs, path::Path};
use crate::config::settings::ExporterConfig;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};
use crate::config::proc_validator;

/// Load and validate config from YAML file
pub fn file_to_config(path: &Path) -> Result<ExporterConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file '{}'", path.display()))?;

    let expanded = expand_env_vars(&content)?;
    parse_config(&expanded)
}

pub fn parse_config(content: &str) -> Result<ExporterConfig> {
    // an empty document keeps every default
    let exporter_config: ExporterConfig = if content.trim().is_empty() {
        ExporterConfig::default()
    } else {
        serde_yaml::from_str(content)
            .inspect_err(|e| error!("parse config error: {}", e))?
    };

    debug!("validation config ...");
    proc_validator::validate_exporter_config(&exporter_config)
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(exporter_config)
}

/// Replace `${VAR}` and `${VAR:default}` placeholders with environment values.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}
