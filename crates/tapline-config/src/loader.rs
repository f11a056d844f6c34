//! Configuration Loader
//!
//! Handles loading the runner config and applying environment overrides.

use crate::runner::{OutputConfig, RunConfig, RunnerConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// File name searched for when loading from a directory
pub const CONFIG_FILE_NAME: &str = "tapline.toml";

/// Configuration loader
///
/// Loads configuration with the following precedence:
/// 1. Runner config (tapline.toml) - lowest priority
/// 2. Environment variables (TAPLINE_*) - overrides the file
/// 3. Programmatic overrides - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides entirely
    ignore_env: bool,
}

/// Loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Runner configuration with overrides applied
    pub runner: RunnerConfig,

    /// Directory containing the tapline.toml that was loaded
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not consult TAPLINE_* environment variables
    pub fn ignore_env(mut self, ignore: bool) -> Self {
        self.ignore_env = ignore;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tapline.toml. A missing file is
    /// not an error; defaults are used instead.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (config_root, runner) = self.find_runner_config(start_dir)?;
        let runner = self.apply_env_overrides(runner)?;

        Ok(Config {
            runner,
            config_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let runner = RunnerConfig::load_from_file(config_path)?;
        let runner = self.apply_env_overrides(runner)?;

        Ok(Config {
            runner,
            config_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find tapline.toml by walking up the directory tree
    fn find_runner_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, RunnerConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let runner = RunnerConfig::load_from_file(&config_path)?;
                return Ok((Some(current), runner));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, RunnerConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// TAPLINE_STACK and TAPLINE_STRIP_CWD take booleans, TAPLINE_EXIT takes
    /// auto, always or never.
    fn apply_env_overrides(&self, mut config: RunnerConfig) -> ConfigResult<RunnerConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        let mut overlay = RunnerConfig::default();

        if let Ok(stack) = env::var("TAPLINE_STACK") {
            overlay
                .output
                .get_or_insert_with(OutputConfig::default)
                .stack = Some(parse_bool("TAPLINE_STACK", &stack)?);
        }

        if let Ok(strip) = env::var("TAPLINE_STRIP_CWD") {
            overlay
                .output
                .get_or_insert_with(OutputConfig::default)
                .strip_cwd = Some(parse_bool("TAPLINE_STRIP_CWD", &strip)?);
        }

        if let Ok(exit) = env::var("TAPLINE_EXIT") {
            overlay.run = Some(RunConfig {
                exit: Some(exit.parse()?),
            });
        }

        config.merge(&overlay);
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

impl Config {
    /// Check if a tapline.toml was found
    pub fn has_config_file(&self) -> bool {
        self.config_root.is_some()
    }

    /// Directory containing the loaded tapline.toml
    pub fn config_root(&self) -> Option<&Path> {
        self.config_root.as_deref()
    }
}
