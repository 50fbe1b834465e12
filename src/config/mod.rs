//! Configuration system for yamlquery.
//!
//! This module provides the configuration structure for yamlquery with sensible
//! defaults and support for serialization/deserialization via serde.
//! Configuration is loaded from a TOML file and command-line flags override it.
//!
//! # Example
//!
//! ```
//! use yamlquery::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.output_format, "yaml");
//! assert_eq!(config.indent_size, 2);
//!
//! // Create custom configuration
//! let custom = Config {
//!     output_format: "json".to_string(),
//!     indent_size: 4,
//!     ..Config::default()
//! };
//! assert_eq!(custom.max_depth, 256);
//! ```

use crate::file::printer::{OutputFormat, PrintOptions};
use crate::navigator::{MissingKeyPolicy, NavigatorOptions, DEFAULT_MAX_DEPTH};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration for the yamlquery command.
///
/// # Fields
///
/// * `indent_size` - Spaces per indentation level in output (default: 2)
/// * `output_format` - "yaml" or "json" (default: "yaml")
/// * `missing_key` - What `.key` does when the key is absent: "skip", "null" or "error" (default: "skip")
/// * `max_depth` - Bound on expression nesting during evaluation (default: 256)
/// * `unwrap_scalars` - Print top-level strings without quotes (default: true)
/// * `preserve_comments` - Reproduce comments from the input (default: true)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Output encoding: "yaml" or "json"
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Missing-key policy: "skip", "null" or "error"
    #[serde(default = "default_missing_key")]
    pub missing_key: String,

    /// Maximum operator nesting during evaluation
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Print top-level string results without quotes
    #[serde(default = "default_true")]
    pub unwrap_scalars: bool,

    /// Keep head and line comments in YAML output
    #[serde(default = "default_true")]
    pub preserve_comments: bool,
}

fn default_indent_size() -> usize {
    2
}

fn default_output_format() -> String {
    "yaml".to_string()
}

fn default_missing_key() -> String {
    "skip".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            output_format: default_output_format(),
            missing_key: default_missing_key(),
            max_depth: default_max_depth(),
            unwrap_scalars: true,
            preserve_comments: true,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlquery/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlquery");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be
    /// parsed; a broken file is reported as a warning.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_else(|err| {
            warn!(path = %config_path.display(), "ignoring config file: {:#}", err);
            Self::default()
        })
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file '{}'", path_ref.display()))
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(config_path)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path_ref, toml_string)?;

        Ok(())
    }

    /// The output format named by `output_format`.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.output_format
            .parse()
            .map_err(|err: String| anyhow::anyhow!(err))
    }

    /// Navigator settings derived from `missing_key` and `max_depth`.
    pub fn navigator_options(&self) -> Result<NavigatorOptions> {
        let missing_key: MissingKeyPolicy = self
            .missing_key
            .parse()
            .map_err(|err: String| anyhow::anyhow!(err))?;
        Ok(NavigatorOptions {
            missing_key,
            max_depth: self.max_depth,
        })
    }

    pub fn print_options(&self) -> PrintOptions {
        PrintOptions {
            indent_size: self.indent_size,
            unwrap_scalars: self.unwrap_scalars,
            preserve_comments: self.preserve_comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserve_comments_default() {
        let config = Config::default();
        assert!(config.preserve_comments);
    }

    #[test]
    fn test_navigator_options() {
        let config = Config {
            missing_key: "error".to_string(),
            max_depth: 32,
            ..Default::default()
        };
        assert_eq!(
            config.navigator_options().unwrap(),
            NavigatorOptions {
                missing_key: MissingKeyPolicy::Error,
                max_depth: 32
            }
        );

        let bad = Config {
            missing_key: "explode".to_string(),
            ..Default::default()
        };
        assert!(bad.navigator_options().is_err());
    }

    #[test]
    fn test_output_format() {
        let config = Config {
            output_format: "JSON".to_string(),
            ..Default::default()
        };
        assert_eq!(config.output_format().unwrap(), OutputFormat::Json);
    }
}
