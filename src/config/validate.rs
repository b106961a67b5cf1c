// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, Settings};
use crate::errors::{FailfastError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::FailfastError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let settings = resolve_settings(&raw.config)?;
        Ok(ConfigFile::new_unchecked(settings, raw.job))
    }
}

/// Validate a raw config without consuming it.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)?;
    resolve_settings(&cfg.config).map(|_| ())
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_jobs(cfg)?;
    ensure_unique_labels(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(FailfastError::ConfigError(
            "config must contain at least one [[job]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    for (idx, job) in cfg.job.iter().enumerate() {
        if job.label.trim().is_empty() {
            return Err(FailfastError::ConfigError(format!(
                "job #{} has an empty label",
                idx + 1
            )));
        }
        if job.cmd.trim().is_empty() {
            return Err(FailfastError::ConfigError(format!(
                "job '{}' has an empty `cmd`",
                job.label
            )));
        }
    }
    Ok(())
}

fn ensure_unique_labels(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for job in cfg.job.iter() {
        if !seen.insert(job.label.as_str()) {
            return Err(FailfastError::DuplicateLabel(job.label.clone()));
        }
    }
    Ok(())
}

fn resolve_settings(section: &ConfigSection) -> Result<Settings> {
    let kill_timeout = parse_duration(&section.kill_timeout).map_err(|e| {
        FailfastError::ConfigError(format!("[config].kill_timeout: {e}"))
    })?;
    if kill_timeout.is_zero() {
        return Err(FailfastError::ConfigError(
            "[config].kill_timeout must be greater than zero".to_string(),
        ));
    }

    let cleanup_delay = parse_duration(&section.cleanup_delay).map_err(|e| {
        FailfastError::ConfigError(format!("[config].cleanup_delay: {e}"))
    })?;

    let workspace_root = section
        .workspace_root
        .clone()
        .unwrap_or_else(default_workspace_root);

    Ok(Settings {
        workspace_root,
        kill_timeout,
        cleanup_delay,
        fallback_hint: section.fallback_hint.clone(),
    })
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("failfast")
}
