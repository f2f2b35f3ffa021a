//! posttime - rewrites post timestamps in HTML into long-form dates
//!
//! Blog templates often print a post's creation time exactly as the database
//! returned it. This library finds those post time elements in an HTML
//! document, reads each one as a date and replaces it with a readable
//! long-form date such as `Mon Jan 02 2023`.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`formatter`] - The post time rewriter and its settings
//! * [`document`] - HTML parsing, selection and serialization
//! * [`config`] - Application configuration management
//! * [`utils`] - Date parsing and formatting helpers
//! * [`cli`] - Command line interface

/// Command line interface
pub mod cli;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// In-memory HTML document and CSS selectors
pub mod document;

/// Error types
pub mod error;

/// Post time rewriting
pub mod formatter;

/// Logging setup
pub mod logger;

/// Utility functions for date/time handling
pub mod utils;

/// Time zone setting
pub mod zone;

pub use document::selector::Selector;
pub use document::{Document, ElementId};
pub use error::{Error, Result};
pub use formatter::{DateFormatter, FormatSettings, RewriteReport, TextMap};
pub use zone::Zone;
