// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// kill_timeout = "5s"
/// fallback_hint = "./scripts/check-sequential.sh"
///
/// [[job]]
/// label = "[Stable] Test (Release)"
/// cmd = "cargo +stable test --release"
///
/// [[job]]
/// label = "[Nightly] Clippy"
/// cmd = "cargo"
/// args = ["+nightly", "clippy"]
/// ```
///
/// Jobs are kept in file order; that order is the registration order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Shared parent directory for per-run workspaces.
    ///
    /// Defaults to `<system temp dir>/failfast`.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// How long a job gets to exit after SIGTERM before it is SIGKILLed.
    #[serde(default = "default_kill_timeout")]
    pub kill_timeout: String,

    /// Delay before the workspace is removed after a failed run.
    #[serde(default = "default_cleanup_delay")]
    pub cleanup_delay: String,

    /// Sequential fallback named in the hint printed after failures.
    #[serde(default)]
    pub fallback_hint: Option<String>,
}

fn default_kill_timeout() -> String {
    "5s".to_string()
}

fn default_cleanup_delay() -> String {
    "1s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workspace_root: None,
            kill_timeout: default_kill_timeout(),
            cleanup_delay: default_cleanup_delay(),
            fallback_hint: None,
        }
    }
}

/// One `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Human-readable label, unique within the file.
    pub label: String,

    /// Shell command line, or the program to launch when `args` is set.
    pub cmd: String,

    /// When present, `cmd` is executed directly with these arguments
    /// instead of through `sh -c`.
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Working directory for the job.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub workspace_root: PathBuf,
    pub kill_timeout: Duration,
    pub cleanup_delay: Duration,
    pub fallback_hint: Option<String>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so labels are known to
/// be unique and durations known to parse.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: Settings,
    pub jobs: Vec<JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(settings: Settings, jobs: Vec<JobConfig>) -> Self {
        Self { settings, jobs }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|j| j.label.as_str())
    }
}
