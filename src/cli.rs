//! Command line interface.
//!
//! Reads HTML from files or stdin, rewrites the post times and writes the
//! result to stdout, back to the files, or to a single output path.

use crate::config::Config;
use crate::constants::{
    ERROR_INVALID_DATES_FOUND, ERROR_IN_PLACE_NEEDS_FILES, ERROR_OUTPUT_NEEDS_SINGLE_INPUT, ERROR_OUTPUT_WITH_IN_PLACE,
};
use crate::formatter::{DateFormatter, RewriteReport};
use crate::logger;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Rewrite post timestamps in HTML documents into long-form dates
#[derive(Debug, Parser)]
#[command(name = "posttime", version, about)]
pub struct Cli {
    /// HTML files to rewrite; reads stdin when none are given
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Overwrite each input file with its rewritten version
    #[arg(short, long)]
    pub in_place: bool,

    /// Write the result to PATH (single input only)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Configuration file to use instead of the default lookup
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// CSS selector for post time elements
    #[arg(long, value_name = "SELECTOR")]
    pub selector: Option<String>,

    /// Time zone to render dates in: "local", "UTC" or an IANA name
    #[arg(long, value_name = "ZONE")]
    pub time_zone: Option<String>,

    /// Locale for month and weekday names, e.g. "fr_FR"
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// strftime pattern for the rendered date
    #[arg(long = "format", value_name = "PATTERN")]
    pub display_format: Option<String>,

    /// Report what would change without writing anything; fails if any post time is not a date
    #[arg(long)]
    pub check: bool,

    /// Write a default configuration file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<PathBuf>,

    /// Log every rewritten element
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Reject option combinations that have no sensible meaning.
    pub fn validate(&self) -> Result<()> {
        if self.output.is_some() && self.in_place {
            anyhow::bail!(ERROR_OUTPUT_WITH_IN_PLACE);
        }
        if self.output.is_some() && self.files.len() > 1 {
            anyhow::bail!(ERROR_OUTPUT_NEEDS_SINGLE_INPUT);
        }
        if self.in_place && self.files.is_empty() {
            anyhow::bail!(ERROR_IN_PLACE_NEEDS_FILES);
        }
        Ok(())
    }

    /// Load the configuration and apply command line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::read(self.config.as_deref())?;

        if let Some(selector) = &self.selector {
            config.formatter.selector = selector.clone();
        }
        if let Some(time_zone) = &self.time_zone {
            config.formatter.time_zone = time_zone.clone();
        }
        if let Some(locale) = &self.locale {
            config.formatter.locale = locale.clone();
        }
        if let Some(display_format) = &self.display_format {
            config.formatter.display_format = display_format.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run the tool. Returns a failing exit code when `--check` finds post
/// times that are not dates.
pub fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(path) = &cli.generate_config {
        Config::generate_default_config(path)?;
        return Ok(ExitCode::SUCCESS);
    }

    cli.validate()?;
    let config = cli.load_config()?;
    logger::setup(&config.logging, cli.verbose)?;

    let formatter = DateFormatter::from_config(&config.formatter)?;
    let total = process(&cli, &formatter)?;

    if cli.check && total.has_invalid() {
        eprintln!("{}", ERROR_INVALID_DATES_FOUND);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Rewrite every input and return the combined counts.
pub fn process(cli: &Cli, formatter: &DateFormatter) -> Result<RewriteReport> {
    let mut total = RewriteReport::default();

    if cli.files.is_empty() {
        let mut html = String::new();
        std::io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read HTML from stdin")?;
        let report = process_source(cli, formatter, "<stdin>", &html, None)?;
        add_report(&mut total, &report);
        return Ok(total);
    }

    for path in &cli.files {
        let html =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let report = process_source(cli, formatter, &path.display().to_string(), &html, Some(path))?;
        add_report(&mut total, &report);
    }
    Ok(total)
}

fn process_source(
    cli: &Cli,
    formatter: &DateFormatter,
    name: &str,
    html: &str,
    path: Option<&Path>,
) -> Result<RewriteReport> {
    let (rewritten, report) = formatter
        .rewrite_html(html)
        .with_context(|| format!("Failed to process {}", name))?;
    info!("{}: {} post time(s) matched", name, report.matched);

    if cli.check {
        println!(
            "{}: {} matched, {} converted, {} invalid",
            name, report.matched, report.converted, report.invalid
        );
        return Ok(report);
    }

    match (&cli.output, path) {
        (Some(output), _) => write_atomically(output, &rewritten)?,
        (None, Some(path)) if cli.in_place => {
            // Leave untouched files alone, keeping their timestamps
            if rewritten != html {
                write_atomically(path, &rewritten)?;
            }
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rewritten.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(report)
}

fn add_report(total: &mut RewriteReport, report: &RewriteReport) {
    total.matched += report.matched;
    total.converted += report.converted;
    total.invalid += report.invalid;
}

/// Write through a temporary file in the same directory, then rename over `path`.
pub fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    // The temp file is created owner-only; keep the mode of the file it replaces
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .with_context(|| format!("Failed to copy permissions of {}", path.display()))?;
    }

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_output_with_in_place() {
        let cli = Cli::parse_from(["posttime", "--in-place", "-o", "out.html", "in.html"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_output_with_many_inputs() {
        let cli = Cli::parse_from(["posttime", "-o", "out.html", "a.html", "b.html"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_in_place_on_stdin() {
        let cli = Cli::parse_from(["posttime", "--in-place"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_plain_files() {
        let cli = Cli::parse_from(["posttime", "a.html", "b.html"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_add_report_sums_counts() {
        let mut total = RewriteReport::default();
        add_report(
            &mut total,
            &RewriteReport {
                matched: 2,
                converted: 1,
                invalid: 1,
            },
        );
        add_report(
            &mut total,
            &RewriteReport {
                matched: 1,
                converted: 1,
                invalid: 0,
            },
        );
        assert_eq!(
            total,
            RewriteReport {
                matched: 3,
                converted: 2,
                invalid: 1
            }
        );
    }
}
