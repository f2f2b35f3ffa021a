//! Constants used throughout the application
//!
//! This module centralizes default values and user-facing messages
//! to improve maintainability and consistency.

// Formatter defaults
/// Elements whose text holds a post timestamp
pub const DEFAULT_SELECTOR: &str = "div.post-time";
/// Weekday, month, day, year. Matches the browser's `Date.prototype.toDateString`.
pub const DEFAULT_DISPLAY_FORMAT: &str = "%a %b %d %Y";
/// Written back when the text cannot be read as a date
pub const INVALID_DATE_MARKER: &str = "Invalid Date";
pub const DEFAULT_LOCALE: &str = "en_US";
/// Time zone setting meaning "whatever the system uses"
pub const LOCAL_TIME_ZONE: &str = "local";

// Configuration lookup
pub const CONFIG_FILE_NAME: &str = "posttime.toml";
pub const CONFIG_DIR_NAME: &str = "posttime";
pub const XDG_CONFIG_FILE_NAME: &str = "config.toml";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const ERROR_INVALID_DATES_FOUND: &str = "❌ Some post times could not be read as dates";
pub const ERROR_OUTPUT_NEEDS_SINGLE_INPUT: &str = "--output can only be used with a single input file";
pub const ERROR_OUTPUT_WITH_IN_PLACE: &str = "--output and --in-place cannot be combined";
pub const ERROR_IN_PLACE_NEEDS_FILES: &str = "--in-place needs at least one input file";
