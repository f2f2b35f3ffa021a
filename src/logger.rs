//! Logging setup for the command line tool.
//!
//! The library only talks to the `log` facade; the binary installs a `fern`
//! dispatcher that writes to stderr and, when configured, to a log file.

use crate::config::LoggingConfig;
use crate::constants::LOG_TIMESTAMP_FORMAT;
use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::path::Path;

/// Build the dispatcher for `config`. `verbose` raises the level to debug.
pub fn dispatch(config: &LoggingConfig, verbose: bool) -> Result<fern::Dispatch> {
    let mut level = config.level_filter()?;
    if verbose && level < LevelFilter::Debug {
        level = LevelFilter::Debug;
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format(LOG_TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(path) = config.file_path() {
        dispatch = dispatch.chain(open_log_file(&path)?);
    }

    Ok(dispatch)
}

/// Install the global logger. Fails if one is already installed.
pub fn setup(config: &LoggingConfig, verbose: bool) -> Result<()> {
    dispatch(config, verbose)?
        .apply()
        .context("Failed to install logger")
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
    }

    fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))
}
