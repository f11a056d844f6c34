//! Runner Configuration (tapline.toml)
//!
//! Controls how diagnostics are rendered and whether a finished run
//! terminates the hosting process.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Runner configuration from tapline.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Diagnostic output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,

    /// Run lifecycle settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,
}

/// Diagnostic output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Capture stack traces for failing assertions (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,

    /// Strip the working directory from stack frames (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_cwd: Option<bool>,

    /// Directory to strip instead of the process working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// Run lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// When the finished run should exit the process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitMode>,
}

/// Whether the terminator exits the hosting process at the end of a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExitMode {
    /// Exit only when reporting to the process's stdout
    #[default]
    Auto,
    /// Always exit with the run status
    Always,
    /// Never exit; the embedding reads the summary instead
    Never,
}

impl FromStr for ExitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ExitMode::Auto),
            "always" => Ok(ExitMode::Always),
            "never" => Ok(ExitMode::Never),
            other => Err(ConfigError::InvalidValue {
                field: "run.exit".to_string(),
                reason: format!("expected auto, always or never, got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ExitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitMode::Auto => "auto",
            ExitMode::Always => "always",
            ExitMode::Never => "never",
        };
        f.write_str(name)
    }
}

impl RunnerConfig {
    /// Load runner configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the runner configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(cwd) = self.output.as_ref().and_then(|o| o.cwd.as_ref()) {
            if cwd.as_os_str().is_empty() || !cwd.is_absolute() {
                return Err(ConfigError::InvalidPath(cwd.clone()));
            }
        }
        Ok(())
    }

    /// Whether failing assertions carry a stack trace
    pub fn capture_stack(&self) -> bool {
        self.output.as_ref().and_then(|o| o.stack).unwrap_or(true)
    }

    /// Whether the working directory is stripped from stack frames
    pub fn strip_cwd(&self) -> bool {
        self.output.as_ref().and_then(|o| o.strip_cwd).unwrap_or(true)
    }

    /// Explicit directory to strip, if configured
    pub fn cwd(&self) -> Option<&Path> {
        self.output.as_ref().and_then(|o| o.cwd.as_deref())
    }

    /// Effective exit mode
    pub fn exit_mode(&self) -> ExitMode {
        self.run.as_ref().and_then(|r| r.exit).unwrap_or_default()
    }

    /// Merge another runner config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &RunnerConfig) {
        if let Some(other_output) = &other.output {
            let output = self.output.get_or_insert_with(Default::default);
            if other_output.stack.is_some() {
                output.stack = other_output.stack;
            }
            if other_output.strip_cwd.is_some() {
                output.strip_cwd = other_output.strip_cwd;
            }
            if other_output.cwd.is_some() {
                output.cwd = other_output.cwd.clone();
            }
        }
        if let Some(exit) = other.run.as_ref().and_then(|r| r.exit) {
            self.run.get_or_insert_with(Default::default).exit = Some(exit);
        }
    }
}
