//! Timestamp extraction from backup names

use crate::backup::{file_name_of, Backup};
use crate::error::{Result, RotateError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};
use std::fmt;
use tracing::debug;

/// Pattern matching timestamps encoded in names
///
/// The date is mandatory, the time of day is optional and the seconds are
/// optional within it. Components may be separated by any single non-digit.
/// Only ASCII digits count.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = r"
    # Required components.
    (?P<year>[0-9]{4}) [^0-9]?
    (?P<month>[0-9]{2}) [^0-9]?
    (?P<day>[0-9]{2}) [^0-9]?
    (?:
        # Optional components.
        (?P<hour>[0-9]{2}) [^0-9]?
        (?P<minute>[0-9]{2}) [^0-9]?
        (?P<second>[0-9]{2})?
    )?
";

const REQUIRED_GROUPS: [&str; 3] = ["year", "month", "day"];

static DEFAULT_REGEX: Lazy<Regex> = Lazy::new(|| {
    compile(DEFAULT_TIMESTAMP_PATTERN).expect("default timestamp pattern is valid")
});

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).ignore_whitespace(true).build()
}

/// Compiled timestamp pattern
///
/// Custom patterns are regular expressions (whitespace-insensitive) with the
/// named groups `year`, `month` and `day`, and optionally `hour`, `minute`
/// and `second`. Groups that didn't participate in a match default to zero.
#[derive(Clone)]
pub struct TimestampPattern {
    regex: Regex,
}

impl TimestampPattern {
    /// Compile a custom pattern, validating its capture groups
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = compile(pattern)?;
        for group in REQUIRED_GROUPS {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(RotateError::MissingCaptureGroup(group));
            }
        }
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Locate a timestamp in `name`
    ///
    /// Only the leftmost match is considered. Returns `None` when nothing
    /// matches or the matched digits don't form a valid date and time.
    pub fn extract(&self, name: &str) -> Option<NaiveDateTime> {
        let captures = self.regex.captures(name)?;

        let year = field(name, &captures, "year")?;
        let month = field(name, &captures, "month")?;
        let day = field(name, &captures, "day")?;
        let hour = field(name, &captures, "hour")?;
        let minute = field(name, &captures, "minute")?;
        let second = field(name, &captures, "second")?;

        let date = i32::try_from(year)
            .ok()
            .filter(|year| *year >= 1)
            .and_then(|year| NaiveDate::from_ymd_opt(year, month, day));
        let time = NaiveTime::from_hms_opt(hour, minute, second);

        match date.zip(time) {
            Some((date, time)) => Some(date.and_time(time)),
            None => {
                debug!(
                    "Ignoring {:?}: {:04}-{:02}-{:02} {:02}:{:02}:{:02} is not a valid date",
                    name, year, month, day, hour, minute, second
                );
                None
            }
        }
    }

    /// Build a backup from a path whose file name carries a timestamp
    pub fn backup_from(&self, path: &str) -> Option<Backup> {
        self.extract(file_name_of(path))
            .map(|timestamp| Backup::new(path, timestamp))
    }
}

fn field(name: &str, captures: &Captures<'_>, group: &str) -> Option<u32> {
    let Some(m) = captures.name(group) else {
        return Some(0);
    };
    match m.as_str().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Ignoring {:?}: {} {:?} is not a number", name, group, m.as_str());
            None
        }
    }
}

impl Default for TimestampPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

impl fmt::Debug for TimestampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimestampPattern").field(&self.regex.as_str()).finish()
    }
}
