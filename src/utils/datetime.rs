//! Date and time utility functions
//!
//! This module reads the free-form timestamps a page template leaves in post
//! time elements and renders them as long-form dates. Parsing follows the
//! browser's lenient `Date` constructor closely enough for the timestamp
//! shapes blog templates produce.

use crate::error::{Error, Result};
use crate::zone::Zone;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Locale, Month, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use std::fmt::Write;

/// ISO calendar date, the only date-only shape the browser reads as UTC
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Wall-clock ISO forms, with `T` or space separator
const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// ISO forms carrying a numeric offset that RFC 3339 rejects
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
];

/// Month-first and year-first slash forms with a clock time
const SLASH_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const SLASH_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y/%m/%d"];

const CLOCK_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// A timestamp read from a post time element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// The text pinned down an instant (explicit zone, or ISO date-only)
    Instant(DateTime<Utc>),
    /// Wall-clock time without a zone, read in the configured zone
    Floating(NaiveDateTime),
}

impl ParsedDate {
    /// Pin the date to an instant, reading floating values in `zone`.
    pub fn resolve(&self, zone: &Zone) -> DateTime<Utc> {
        match self {
            ParsedDate::Instant(instant) => *instant,
            ParsedDate::Floating(naive) => zone.resolve_local(naive),
        }
    }
}

/// Parse the text of a post time element.
///
/// Surrounding whitespace is ignored. Returns `None` when the text is not a
/// date, which callers render as the invalid-date marker.
pub fn parse_post_date(text: &str) -> Option<ParsedDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    parse_iso(text)
        .or_else(|| DateTime::parse_from_rfc2822(text).ok().map(|dt| ParsedDate::Instant(dt.with_timezone(&Utc))))
        .or_else(|| parse_slash(text))
        .or_else(|| parse_textual(text))
}

fn parse_iso(text: &str) -> Option<ParsedDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedDate::Instant(dt.with_timezone(&Utc)));
    }

    if let Some(date) = parse_iso_date_only(text) {
        return Some(ParsedDate::Instant(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?)));
    }

    // A trailing `Z` pins wall-clock forms to UTC
    let (body, utc) = match text.strip_suffix(&['Z', 'z'][..]) {
        Some(body) => (body, true),
        None => (text, false),
    };
    for format in ISO_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(body, format) {
            return Some(if utc {
                ParsedDate::Instant(Utc.from_utc_datetime(&naive))
            } else {
                ParsedDate::Floating(naive)
            });
        }
    }

    for format in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(ParsedDate::Instant(dt.with_timezone(&Utc)));
        }
    }

    // Unpadded dates like 2023-1-2 are not ISO; the browser reads them as local
    let date = NaiveDate::parse_from_str(text, ISO_DATE_FORMAT).ok()?;
    Some(ParsedDate::Floating(date.and_hms_opt(0, 0, 0)?))
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`, strictly zero-padded.
fn parse_iso_date_only(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        4 if digits(0..4) => NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1),
        7 if digits(0..4) && bytes[4] == b'-' && digits(5..7) => {
            NaiveDate::from_ymd_opt(text[..4].parse().ok()?, text[5..].parse().ok()?, 1)
        }
        10 if digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10) => {
            NaiveDate::parse_from_str(text, ISO_DATE_FORMAT).ok()
        }
        _ => None,
    }
}

fn parse_slash(text: &str) -> Option<ParsedDate> {
    if !text.contains('/') {
        return None;
    }

    for format in SLASH_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedDate::Floating(naive));
        }
    }
    let date = SLASH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())?;
    Some(ParsedDate::Floating(date.and_hms_opt(0, 0, 0)?))
}

/// Month-name forms such as `Jan 2, 2023`, `2 January 2023` or
/// `Mon Jan 02 2023`, with an optional trailing clock time.
fn parse_textual(text: &str) -> Option<ParsedDate> {
    let cleaned = text.replace(',', " ");
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // The weekday carries no information the rest of the date doesn't
    if tokens.first().is_some_and(|t| t.trim_end_matches('.').parse::<Weekday>().is_ok()) {
        tokens.remove(0);
    }

    let time = match tokens.len() {
        4 => parse_clock(tokens.pop()?)?,
        3 => NaiveTime::from_hms_opt(0, 0, 0)?,
        _ => return None,
    };

    let (month, day) = match (parse_month(tokens[0]), parse_month(tokens[1])) {
        (Some(month), None) => (month, tokens[1]),
        (None, Some(month)) => (month, tokens[0]),
        _ => return None,
    };
    let day: u32 = day.parse().ok()?;
    let year: i32 = tokens[2].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month.number_from_month(), day)?;
    Some(ParsedDate::Floating(date.and_time(time)))
}

fn parse_month(token: &str) -> Option<Month> {
    token.trim_end_matches('.').parse::<Month>().ok()
}

fn parse_clock(token: &str) -> Option<NaiveTime> {
    CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(token, format).ok())
}

/// Resolve a locale name such as `en_US` or `fr_FR`.
pub fn parse_locale(name: &str) -> Result<Locale> {
    Locale::try_from(name.trim()).map_err(|_| Error::InvalidLocale(name.to_string()))
}

/// Check that a strftime pattern can render a date.
pub fn validate_display_format(format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(Error::InvalidDisplayFormat(format.to_string(), "pattern is empty".to_string()));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidDisplayFormat(
            format.to_string(),
            "unknown or incomplete specifier".to_string(),
        ));
    }
    Ok(())
}

/// Render an instant in `zone` with a strftime pattern and locale.
///
/// Returns `None` if the pattern cannot be rendered.
pub fn format_long_date(instant: &DateTime<Utc>, zone: &Zone, display_format: &str, locale: Locale) -> Option<String> {
    let mut out = String::new();
    let written = match zone {
        Zone::Local => write!(
            out,
            "{}",
            instant.with_timezone(&Local).format_localized(display_format, locale)
        ),
        Zone::Named(tz) => write!(out, "{}", instant.with_timezone(tz).format_localized(display_format, locale)),
    };
    written.ok().map(|_| out)
}
