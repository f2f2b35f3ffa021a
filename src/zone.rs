//! Time zone setting used to render post dates.
//!
//! The browser renders in whatever zone the machine runs in. Here the zone is
//! an explicit setting so output can be pinned: either the system local zone
//! or a named IANA zone.

use crate::constants::LOCAL_TIME_ZONE;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// System local time zone
    #[default]
    Local,
    /// Named IANA zone, `UTC` included
    Named(Tz),
}

impl Zone {
    /// Parse a zone setting. `local` (any case) selects the system zone,
    /// anything else must be an IANA name such as `Europe/Paris` or `UTC`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(LOCAL_TIME_ZONE) {
            return Ok(Zone::Local);
        }

        value
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| Error::InvalidTimeZone(value.to_string()))
    }

    /// Resolve a wall-clock time in this zone to an instant.
    ///
    /// Ambiguous times take the earlier instant. Times falling in a DST gap
    /// use the offset in force before the gap, so they land just after it on
    /// the same calendar day.
    pub fn resolve_local(&self, naive: &NaiveDateTime) -> DateTime<Utc> {
        match self {
            Zone::Local => resolve_in(&Local, naive),
            Zone::Named(tz) => resolve_in(tz, naive),
        }
    }
}

/// Longest stretch of skipped wall time searched for the pre-gap offset
const GAP_SEARCH_MINUTES: i64 = 26 * 60;
const GAP_SEARCH_STEP_MINUTES: i64 = 15;

fn resolve_in<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = zone.from_local_datetime(naive).earliest() {
        return dt.with_timezone(&Utc);
    }

    // Nonexistent wall time: walk back to the last valid one before the gap
    let offset_before_gap = (1..=GAP_SEARCH_MINUTES / GAP_SEARCH_STEP_MINUTES)
        .filter_map(|step| naive.checked_sub_signed(Duration::minutes(step * GAP_SEARCH_STEP_MINUTES)))
        .find_map(|before| zone.from_local_datetime(&before).earliest())
        .map(|before| before.offset().fix().local_minus_utc());

    offset_before_gap
        .and_then(|seconds| naive.checked_sub_signed(Duration::seconds(i64::from(seconds))))
        .map(|utc| Utc.from_utc_datetime(&utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(naive))
}

impl FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Zone::parse(s)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str(LOCAL_TIME_ZONE),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}
