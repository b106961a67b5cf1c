// src/config/mod.rs

//! Configuration loading and validation for failfast.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate labels, commands and durations (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, JobConfig, RawConfigFile, Settings};
pub use validate::validate_config;
