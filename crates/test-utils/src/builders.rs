#![allow(dead_code)]

use std::path::Path;

use failfast::config::{ConfigFile, ConfigSection, JobConfig, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                job: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.job.push(job);
        self
    }

    pub fn workspace_root(mut self, path: &Path) -> Self {
        self.config.config.workspace_root = Some(path.to_path_buf());
        self
    }

    pub fn kill_timeout(mut self, duration: &str) -> Self {
        self.config.config.kill_timeout = duration.to_string();
        self
    }

    pub fn cleanup_delay(mut self, duration: &str) -> Self {
        self.config.config.cleanup_delay = duration.to_string();
        self
    }

    pub fn fallback_hint(mut self, hint: &str) -> Self {
        self.config.config.fallback_hint = Some(hint.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(label: &str, cmd: &str) -> Self {
        Self {
            job: JobConfig {
                label: label.to_string(),
                cmd: cmd.to_string(),
                args: None,
                dir: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.job.args.get_or_insert_with(Vec::new).push(arg.to_string());
        self
    }

    pub fn dir(mut self, dir: &Path) -> Self {
        self.job.dir = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
