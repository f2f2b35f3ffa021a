//! Post time rewriting.
//!
//! [`DateFormatter`] finds every post time element in a document, reads its
//! text as a date and replaces it with a long-form date such as
//! `Mon Jan 02 2023`. Text that is not a date becomes the invalid-date marker;
//! that never stops the remaining elements from being processed.
//!
//! The date handling is available without a document through
//! [`DateFormatter::format_text`] and [`DateFormatter::format_texts`], which
//! work on plain strings keyed by element id.

use crate::config::FormatterConfig;
use crate::constants::{DEFAULT_DISPLAY_FORMAT, INVALID_DATE_MARKER};
use crate::document::selector::Selector;
use crate::document::{Document, ElementId};
use crate::error::Result;
use crate::utils::datetime::{self, format_long_date, parse_post_date};
use crate::zone::Zone;
use chrono::Locale;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Element id to element text, ordered by document position
pub type TextMap = BTreeMap<ElementId, String>;

/// Everything that decides how post times are found and rendered.
#[derive(Debug, Clone)]
pub struct FormatSettings {
    pub selector: Selector,
    pub zone: Zone,
    pub locale: Locale,
    /// strftime pattern for the rendered date
    pub display_format: String,
    pub invalid_marker: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            selector: Selector::default(),
            zone: Zone::Local,
            locale: Locale::en_US,
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
            invalid_marker: INVALID_DATE_MARKER.to_string(),
        }
    }
}

/// Counts from one pass over a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Elements the selector matched
    pub matched: usize,
    /// Elements rewritten to a date
    pub converted: usize,
    /// Elements rewritten to the invalid-date marker
    pub invalid: usize,
}

impl RewriteReport {
    pub fn has_invalid(&self) -> bool {
        self.invalid > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateFormatter {
    settings: FormatSettings,
}

impl DateFormatter {
    pub fn new(settings: FormatSettings) -> Self {
        Self { settings }
    }

    /// Build a formatter from configuration values, rejecting an unsupported
    /// selector, unknown zone or locale, or a display format that can't render.
    pub fn from_config(config: &FormatterConfig) -> Result<Self> {
        datetime::validate_display_format(&config.display_format)?;

        Ok(Self::new(FormatSettings {
            selector: Selector::parse(&config.selector)?,
            zone: Zone::parse(&config.time_zone)?,
            locale: datetime::parse_locale(&config.locale)?,
            display_format: config.display_format.clone(),
            invalid_marker: config.invalid_marker.clone(),
        }))
    }

    pub fn settings(&self) -> &FormatSettings {
        &self.settings
    }

    /// Render one element text. Never fails: text that is not a date gives
    /// the invalid-date marker.
    pub fn format_text(&self, raw: &str) -> String {
        self.try_format(raw)
            .unwrap_or_else(|| self.settings.invalid_marker.clone())
    }

    fn try_format(&self, raw: &str) -> Option<String> {
        let instant = parse_post_date(raw)?.resolve(&self.settings.zone);
        format_long_date(
            &instant,
            &self.settings.zone,
            &self.settings.display_format,
            self.settings.locale,
        )
    }

    /// Render every text in `texts`. Each output depends only on the text
    /// stored under the same id.
    pub fn format_texts(&self, texts: TextMap) -> TextMap {
        texts
            .into_iter()
            .map(|(id, text)| {
                let display = self.format_text(&text);
                (id, display)
            })
            .collect()
    }

    /// Text of every post time element in `doc`.
    pub fn collect_texts(&self, doc: &Document) -> TextMap {
        doc.query_selector_all(&self.settings.selector)
            .into_iter()
            .map(|id| (id, doc.text_content(id)))
            .collect()
    }

    /// Parse `html`, rewrite its post times and serialize it again.
    pub fn rewrite_html(&self, html: &str) -> Result<(String, RewriteReport)> {
        let mut doc = Document::parse(html)?;
        let report = self.run(&mut doc);
        Ok((doc.to_html(), report))
    }

    /// Rewrite every post time element in `doc`, in document order.
    pub fn run(&self, doc: &mut Document) -> RewriteReport {
        let targets = doc.query_selector_all(&self.settings.selector);
        let mut report = RewriteReport {
            matched: targets.len(),
            ..RewriteReport::default()
        };

        if targets.is_empty() {
            debug!("No elements match '{}'", self.settings.selector);
            return report;
        }

        for id in targets {
            let original = doc.text_content(id);
            let display = match self.try_format(&original) {
                Some(display) => {
                    debug!("Rewrote post time '{}' -> '{}'", original.trim(), display);
                    report.converted += 1;
                    display
                }
                None => {
                    warn!("Post time '{}' is not a date", original.trim());
                    report.invalid += 1;
                    self.settings.invalid_marker.clone()
                }
            };
            doc.set_text_content(id, &display);
        }

        info!(
            "Rewrote {} post time(s): {} converted, {} invalid",
            report.matched, report.converted, report.invalid
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn utc_formatter() -> DateFormatter {
        DateFormatter::new(FormatSettings {
            zone: Zone::Named(Tz::UTC),
            ..FormatSettings::default()
        })
    }

    #[test]
    fn test_format_text_iso_instant() {
        assert_eq!(utc_formatter().format_text("2023-01-02T00:00:00Z"), "Mon Jan 02 2023");
    }

    #[test]
    fn test_format_text_invalid() {
        assert_eq!(utc_formatter().format_text("not a date"), "Invalid Date");
        assert_eq!(utc_formatter().format_text("   "), "Invalid Date");
    }

    #[test]
    fn test_custom_marker() {
        let formatter = DateFormatter::new(FormatSettings {
            invalid_marker: "unknown".to_string(),
            ..FormatSettings::default()
        });
        assert_eq!(formatter.format_text("soon"), "unknown");
    }

    #[test]
    fn test_report_has_invalid() {
        let report = RewriteReport {
            matched: 2,
            converted: 1,
            invalid: 1,
        };
        assert!(report.has_invalid());
        assert!(!RewriteReport::default().has_invalid());
    }
}
