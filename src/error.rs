//! Error types for document and formatter operations.
//!
//! Unparseable dates are not errors: they render as the invalid-date marker.
//! Everything here is a setup or input failure the caller has to deal with.

/// Common error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    #[error("Unsupported selector: '{0}'")]
    UnsupportedSelector(String),

    #[error("Unknown time zone: '{0}'")]
    InvalidTimeZone(String),

    #[error("Unknown locale: '{0}'")]
    InvalidLocale(String),

    #[error("Invalid display format '{0}': {1}")]
    InvalidDisplayFormat(String, String),
}

pub type Result<T> = std::result::Result<T, Error>;
