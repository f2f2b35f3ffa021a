//! Configuration management for posttime
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DEFAULT_DISPLAY_FORMAT, DEFAULT_LOCALE, DEFAULT_LOG_LEVEL,
    DEFAULT_SELECTOR, INVALID_DATE_MARKER, LOCAL_TIME_ZONE, XDG_CONFIG_FILE_NAME,
};
use crate::formatter::DateFormatter;
use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub formatter: FormatterConfig,
    pub logging: LoggingConfig,
}

/// How post time elements are found and rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// CSS selector for post time elements
    pub selector: String,
    /// Zone dates are rendered in
    /// Options: "local", "UTC", or an IANA name such as "Europe/Paris"
    pub time_zone: String,
    /// Locale for month and weekday names, e.g. "en_US", "fr_FR"
    pub locale: String,
    /// strftime pattern for the rendered date
    pub display_format: String,
    /// Text written when a post time is not a date
    pub invalid_marker: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: "off", "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Also append log lines to this file (empty = stderr only)
    pub file: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            time_zone: LOCAL_TIME_ZONE.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
            invalid_marker: INVALID_DATE_MARKER.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: String::new(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log level
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }

    /// Log file path, if one is configured
    pub fn file_path(&self) -> Option<PathBuf> {
        let file = self.file.trim();
        if file.is_empty() {
            None
        } else {
            Some(PathBuf::from(file))
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config = Self::read(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read(Some(path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration without validating it, from `path` or from the
    /// default lookup. Callers that apply overrides validate afterwards.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::find_config_file() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Some(current_dir_config);
        }

        // 2. Check XDG config directory
        Self::get_default_config_path().ok().filter(|path| path.exists())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.formatter.selector.trim().is_empty() {
            anyhow::bail!("selector cannot be empty");
        }
        if self.formatter.invalid_marker.is_empty() {
            anyhow::bail!("invalid_marker cannot be empty");
        }

        // Selector, zone, locale and display format are checked by building a formatter
        DateFormatter::from_config(&self.formatter).context("Invalid [formatter] configuration")?;

        self.logging.level_filter()?;

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# posttime Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format(crate::utils::datetime::ISO_DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(CONFIG_DIR_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join(XDG_CONFIG_FILE_NAME))
    }
}
