use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use regex::Regex;

/// Expand `$VAR` / `${VAR}` references (unset variables become empty), then a leading `~`.
pub fn expand_path(path: &str) -> Result<String> {
    let re = Regex::new(r"\$(?:\{(\w+)\}|(\w+))")?;
    let expanded = re
        .replace_all(path, |caps: &regex::Captures| {
            let var = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env::var(var).unwrap_or_default()
        })
        .to_string();

    match expanded.strip_prefix('~') {
        Some(rest) => {
            let home = home_dir().ok_or_else(|| anyhow!("cannot resolve home directory for '{}'", path))?;
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                Ok(home.to_string_lossy().into_owned())
            } else {
                Ok(home.join(rest).to_string_lossy().into_owned())
            }
        }
        None => Ok(expanded),
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
