//! Tapline Configuration
//!
//! Configuration for a tapline run:
//! - Runner configuration file (`tapline.toml`)
//! - Environment variable overrides (`TAPLINE_*`)
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Runner config (`tapline.toml`, found by walking up from a directory)
//! 3. Environment variables (`TAPLINE_STACK`, `TAPLINE_STRIP_CWD`, `TAPLINE_EXIT`)
//! 4. Programmatic overrides (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use tapline_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! assert!(config.runner.capture_stack());
//! ```

pub mod loader;
pub mod runner;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use runner::{ExitMode, OutputConfig, RunConfig, RunnerConfig};
