use clap::Parser;
use posttime::cli::{self, Cli};
use posttime::DateFormatter;
use std::path::{Path, PathBuf};

const PAGE: &str = "<html><body>\n<div class=\"post-time\">2023-01-02 15:04:05</div>\n<div class=\"post-time\">tbd</div>\n</body></html>\n";

/// Temp directory holding a pinned config file
fn workspace() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("posttime.toml");
    std::fs::write(&config, "[formatter]\ntime_zone = \"UTC\"\n").unwrap();
    (dir, config)
}

fn write_page(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, html).unwrap();
    path
}

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("posttime").chain(args.iter().copied()))
}

fn formatter_for(cli: &Cli) -> DateFormatter {
    let config = cli.load_config().unwrap();
    DateFormatter::from_config(&config.formatter).unwrap()
}

#[test]
fn test_in_place_rewrites_file() {
    let (dir, config) = workspace();
    let page = write_page(dir.path(), "index.html", PAGE);

    let cli = parse(&["--in-place", "--config", config.to_str().unwrap(), page.to_str().unwrap()]);
    cli.validate().unwrap();
    let report = cli::process(&cli, &formatter_for(&cli)).unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.converted, 1);
    assert_eq!(report.invalid, 1);
    assert_eq!(
        std::fs::read_to_string(&page).unwrap(),
        "<html><body>\n<div class=\"post-time\">Mon Jan 02 2023</div>\n<div class=\"post-time\">Invalid Date</div>\n</body></html>\n"
    );
}

#[test]
fn test_output_path_leaves_input_alone() {
    let (dir, config) = workspace();
    let page = write_page(dir.path(), "index.html", PAGE);
    let output = dir.path().join("out").join("index.html");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();

    let cli = parse(&[
        "--config",
        config.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        page.to_str().unwrap(),
    ]);
    cli::process(&cli, &formatter_for(&cli)).unwrap();

    assert_eq!(std::fs::read_to_string(&page).unwrap(), PAGE);
    assert!(std::fs::read_to_string(&output).unwrap().contains("Mon Jan 02 2023"));
}

#[test]
fn test_check_mode_writes_nothing() {
    let (dir, config) = workspace();
    let page = write_page(dir.path(), "index.html", PAGE);

    let cli = parse(&["--check", "--in-place", "--config", config.to_str().unwrap(), page.to_str().unwrap()]);
    let report = cli::process(&cli, &formatter_for(&cli)).unwrap();

    assert!(report.has_invalid());
    assert_eq!(std::fs::read_to_string(&page).unwrap(), PAGE);
}

#[test]
fn test_reports_are_summed_across_files() {
    let (dir, config) = workspace();
    let first = write_page(dir.path(), "a.html", PAGE);
    let second = write_page(dir.path(), "b.html", "<div class=\"post-time\">2024-05-01</div>");

    let cli = parse(&[
        "--in-place",
        "--config",
        config.to_str().unwrap(),
        first.to_str().unwrap(),
        second.to_str().unwrap(),
    ]);
    let report = cli::process(&cli, &formatter_for(&cli)).unwrap();

    assert_eq!(report.matched, 3);
    assert_eq!(report.converted, 2);
    assert_eq!(
        std::fs::read_to_string(&second).unwrap(),
        "<div class=\"post-time\">Wed May 01 2024</div>"
    );
}

#[test]
fn test_command_line_overrides_config_file() {
    let (_dir, config) = workspace();
    let cli = parse(&[
        "--config",
        config.to_str().unwrap(),
        "--time-zone",
        "America/New_York",
        "--selector",
        "time",
        "--locale",
        "fr_FR",
        "--format",
        "%d/%m/%Y",
    ]);

    let loaded = cli.load_config().unwrap();
    assert_eq!(loaded.formatter.time_zone, "America/New_York");
    assert_eq!(loaded.formatter.selector, "time");
    assert_eq!(loaded.formatter.locale, "fr_FR");
    assert_eq!(loaded.formatter.display_format, "%d/%m/%Y");

    let formatter = DateFormatter::from_config(&loaded.formatter).unwrap();
    assert_eq!(formatter.format_text("2023-01-02T00:00:00Z"), "01/01/2023");
}

#[test]
fn test_invalid_override_is_rejected() {
    let (_dir, config) = workspace();
    let cli = parse(&["--config", config.to_str().unwrap(), "--time-zone", "Nowhere/Special"]);
    assert!(cli.load_config().is_err());
}

#[test]
fn test_missing_input_file_is_an_error() {
    let (dir, config) = workspace();
    let missing = dir.path().join("missing.html");
    let cli = parse(&["--config", config.to_str().unwrap(), missing.to_str().unwrap()]);

    let err = cli::process(&cli, &formatter_for(&cli)).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_malformed_html_names_the_file() {
    let (dir, config) = workspace();
    let page = write_page(dir.path(), "broken.html", "<div class=\"post-time\">2023<!-- oops");
    let cli = parse(&["--in-place", "--config", config.to_str().unwrap(), page.to_str().unwrap()]);

    let err = cli::process(&cli, &formatter_for(&cli)).unwrap_err();
    assert!(err.to_string().contains("broken.html"));
}

#[test]
fn test_write_atomically_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), "page.html", "old");
    cli::write_atomically(&path, "new").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
}

#[cfg(unix)]
#[test]
fn test_write_atomically_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), "page.html", "old");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    cli::write_atomically(&path, "new").unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
}

#[test]
fn test_command_line_rescues_bad_config_value() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("posttime.toml");
    std::fs::write(&config, "[formatter]\ntime_zone = \"Nowhere/Special\"\n").unwrap();

    let broken = parse(&["--config", config.to_str().unwrap()]);
    assert!(broken.load_config().is_err());

    let rescued = parse(&["--config", config.to_str().unwrap(), "--time-zone", "UTC"]);
    let loaded = rescued.load_config().unwrap();
    assert_eq!(loaded.formatter.time_zone, "UTC");
}
