use posttime::config::Config;
use posttime::constants::{DEFAULT_DISPLAY_FORMAT, DEFAULT_SELECTOR};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.formatter.selector, "div.post-time");
    assert_eq!(config.formatter.time_zone, "local");
    assert_eq!(config.formatter.locale, "en_US");
    assert_eq!(config.formatter.display_format, "%a %b %d %Y");
    assert_eq!(config.formatter.invalid_marker, "Invalid Date");
    assert_eq!(config.logging.level, "warn");
    assert!(config.logging.file_path().is_none());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Unknown time zone should fail
    config.formatter.time_zone = "Atlantis/Capital".to_string();
    assert!(config.validate().is_err());

    // Reset and test unsupported selector
    config.formatter.time_zone = "Europe/Berlin".to_string();
    assert!(config.validate().is_ok());
    config.formatter.selector = "div:first-child".to_string();
    assert!(config.validate().is_err());

    // Reset and test unknown locale
    config.formatter.selector = DEFAULT_SELECTOR.to_string();
    config.formatter.locale = "xx_YY".to_string();
    assert!(config.validate().is_err());

    // Reset and test broken display format
    config.formatter.locale = "de_DE".to_string();
    assert!(config.validate().is_ok());
    config.formatter.display_format = "%a %".to_string();
    assert!(config.validate().is_err());

    // Reset and test empty marker
    config.formatter.display_format = DEFAULT_DISPLAY_FORMAT.to_string();
    config.formatter.invalid_marker = String::new();
    assert!(config.validate().is_err());

    // Reset and test unknown log level
    config.formatter.invalid_marker = "?".to_string();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_level_filter_parsing() {
    let mut config = Config::default();
    config.logging.level = "DEBUG".to_string();
    assert_eq!(config.logging.level_filter().unwrap(), log::LevelFilter::Debug);
    config.logging.level = "off".to_string();
    assert_eq!(config.logging.level_filter().unwrap(), log::LevelFilter::Off);
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("selector = \"div.post-time\""));
    assert!(toml_str.contains("time_zone = \"local\""));
    assert!(toml_str.contains("level = \"warn\""));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[formatter]
time_zone = "UTC"

[logging]
level = "debug"
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.formatter.time_zone, "UTC");
    assert_eq!(config.logging.level, "debug");

    // Check that unspecified values use defaults
    assert_eq!(config.formatter.selector, DEFAULT_SELECTOR);
    assert_eq!(config.formatter.display_format, DEFAULT_DISPLAY_FORMAT);
    assert_eq!(config.formatter.invalid_marker, "Invalid Date");
    assert!(config.logging.file.is_empty());
}

#[test]
fn test_empty_config_deserialization() {
    // Test that empty TOML uses all defaults
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.formatter.selector, default_config.formatter.selector);
    assert_eq!(config.formatter.time_zone, default_config.formatter.time_zone);
    assert_eq!(config.formatter.locale, default_config.formatter.locale);
    assert_eq!(config.logging.level, default_config.logging.level);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posttime.toml");
    std::fs::write(&path, "[formatter]\ntime_zone = \"Nowhere/Special\"\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Nowhere/Special"));
}

#[test]
fn test_load_from_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_file(dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_generate_config_creates_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");
    assert!(!config_path.parent().unwrap().exists());

    // Generate config should create the directory structure
    let result = Config::generate_default_config(&config_path);
    assert!(result.is_ok());
    assert!(config_path.exists());

    // Verify the file contains expected content
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# posttime Configuration File"));
    assert!(content.contains("selector = \"div.post-time\""));

    // The generated file loads back as the defaults
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.formatter.selector, DEFAULT_SELECTOR);
    assert_eq!(loaded.formatter.time_zone, "local");
}

#[test]
fn test_read_skips_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posttime.toml");
    std::fs::write(&path, "[formatter]\ntime_zone = \"Nowhere/Special\"\n").unwrap();

    // Raw values come back as written; validation is left to the caller
    let config = Config::read(Some(&path)).unwrap();
    assert_eq!(config.formatter.time_zone, "Nowhere/Special");
    assert!(config.validate().is_err());
}

#[test]
fn test_default_config_path_is_under_xdg_dir() {
    if let Ok(path) = Config::get_default_config_path() {
        assert!(path.ends_with("posttime/config.toml"));
        assert_eq!(path.parent().unwrap(), Config::get_xdg_config_dir().unwrap());
    }
}
