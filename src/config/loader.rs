// src/config/loader.rs

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FailfastError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Checks for an empty job list, empty labels/commands, duplicate labels and
/// malformed durations.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

impl ConfigFile {
    /// Keep only the jobs whose labels are listed, preserving file order.
    ///
    /// An empty `labels` slice keeps everything.
    pub fn retain_only(&mut self, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }

        for wanted in labels {
            if !self.jobs.iter().any(|j| &j.label == wanted) {
                return Err(FailfastError::ConfigError(format!(
                    "--only refers to unknown job '{wanted}'"
                )));
            }
        }

        self.jobs.retain(|j| labels.contains(&j.label));
        Ok(())
    }

    pub fn override_kill_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(FailfastError::ConfigError(
                "--kill-timeout must be greater than zero".to_string(),
            ));
        }
        self.settings.kill_timeout = timeout;
        Ok(())
    }
}
