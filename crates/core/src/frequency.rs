//! Rotation frequencies and their time buckets

use crate::backup::Backup;
use crate::error::RotateError;
use chrono::{Duration, Months, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// A named retention granularity
///
/// Variants are declared from the smallest bucket width to the largest, so
/// the derived ordering is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Every supported frequency, smallest bucket width first
pub const ORDERED_FREQUENCIES: [Frequency; 6] = [
    Frequency::Minutely,
    Frequency::Hourly,
    Frequency::Daily,
    Frequency::Weekly,
    Frequency::Monthly,
    Frequency::Yearly,
];

/// Width of one bucket
///
/// Months and years follow the calendar (stepping back from March 31 by one
/// month lands on the last day of February).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketWidth {
    Seconds(i64),
    Months(u32),
}

/// Identifies one time slot for one frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Minute {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
    Hour {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
    },
    Day {
        year: i32,
        month: u32,
        day: u32,
    },
    /// Calendar year paired with the ISO week number
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl Frequency {
    pub const fn name(self) -> &'static str {
        match self {
            Frequency::Minutely => "minutely",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub const fn width(self) -> BucketWidth {
        match self {
            Frequency::Minutely => BucketWidth::Seconds(60),
            Frequency::Hourly => BucketWidth::Seconds(60 * 60),
            Frequency::Daily => BucketWidth::Seconds(24 * 60 * 60),
            Frequency::Weekly => BucketWidth::Seconds(7 * 24 * 60 * 60),
            Frequency::Monthly => BucketWidth::Months(1),
            Frequency::Yearly => BucketWidth::Months(12),
        }
    }

    /// The bucket `backup` falls into for this frequency
    pub fn bucket_key(self, backup: &Backup) -> BucketKey {
        match self {
            Frequency::Minutely => BucketKey::Minute {
                year: backup.year(),
                month: backup.month(),
                day: backup.day(),
                hour: backup.hour(),
                minute: backup.minute(),
            },
            Frequency::Hourly => BucketKey::Hour {
                year: backup.year(),
                month: backup.month(),
                day: backup.day(),
                hour: backup.hour(),
            },
            Frequency::Daily => BucketKey::Day {
                year: backup.year(),
                month: backup.month(),
                day: backup.day(),
            },
            Frequency::Weekly => BucketKey::Week {
                year: backup.year(),
                week: backup.iso_week(),
            },
            Frequency::Monthly => BucketKey::Month {
                year: backup.year(),
                month: backup.month(),
            },
            Frequency::Yearly => BucketKey::Year {
                year: backup.year(),
            },
        }
    }

    /// `most_recent` minus `count` bucket widths
    ///
    /// Returns `None` when the result falls outside the representable range,
    /// in which case there is no window to enforce.
    pub fn window_start(self, most_recent: NaiveDateTime, count: u32) -> Option<NaiveDateTime> {
        match self.width() {
            BucketWidth::Seconds(seconds) => {
                let total = seconds.checked_mul(i64::from(count))?;
                most_recent.checked_sub_signed(Duration::seconds(total))
            }
            BucketWidth::Months(months) => {
                let total = months.checked_mul(count)?;
                most_recent.checked_sub_months(Months::new(total))
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frequency {
    type Err = RotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ORDERED_FREQUENCIES
            .into_iter()
            .find(|frequency| frequency.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RotateError::UnknownFrequency(s.to_string()))
    }
}
