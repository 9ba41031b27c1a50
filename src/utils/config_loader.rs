use std::path::Path;
use anyhow::{anyhow, Result};

use crate::config::proc_loader::file_to_config;
use crate::config::settings::ExporterConfig;
use crate::utils::path::expand_path;

/// Load the exporter config and expand `kubeconfig_path`.
pub fn run(config_path: &str) -> Result<ExporterConfig> {
    let path = Path::new(config_path);
    let mut config = file_to_config(path).map_err(|e| anyhow!("Invalid config '{}': {:#}", config_path, e))?;
    config.kubeconfig_path = expand_path(&config.kubeconfig_path)
        .map_err(|e| anyhow!("Error expanding kubeconfig path '{}': {:#}", config.kubeconfig_path, e))?;
    Ok(config)
}
