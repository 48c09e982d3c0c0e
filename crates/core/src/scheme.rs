//! Retention schemes

use crate::error::{Result, RotateError};
use crate::expr;
use crate::frequency::Frequency;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How many buckets of one frequency to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Keep the most recent `n` buckets, at least one
    Count(u32),
    /// Keep every bucket
    Always,
}

impl FromStr for Retention {
    type Err = RotateError;

    /// Accepts `always` (any case), an integer, or an integer expression
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("always") {
            return Ok(Retention::Always);
        }
        let number = expr::evaluate(value)
            .map_err(|e| RotateError::InvalidRetention(format!("{value}: {e}")))?;
        Retention::from_count(number)
            .map_err(|_| RotateError::InvalidRetention(format!("{value}: {}", count_range())))
    }
}

impl Retention {
    /// A finite retention, which must be a positive count
    pub fn from_count(count: i64) -> Result<Self> {
        u32::try_from(count)
            .ok()
            .filter(|count| *count > 0)
            .map(Retention::Count)
            .ok_or_else(|| RotateError::InvalidRetention(format!("{count}: {}", count_range())))
    }
}

fn count_range() -> String {
    format!("must be between 1 and {}", u32::MAX)
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retention::Count(count) => write!(f, "{count}"),
            Retention::Always => f.write_str("always"),
        }
    }
}

/// Frequency to retention mapping for one rotation run
///
/// Frequencies missing from the scheme retain nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionScheme {
    periods: BTreeMap<Frequency, Retention>,
}

impl RetentionScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, frequency: Frequency, retention: Retention) -> Self {
        self.set(frequency, retention);
        self
    }

    pub fn set(&mut self, frequency: Frequency, retention: Retention) {
        self.periods.insert(frequency, retention);
    }

    pub fn get(&self, frequency: Frequency) -> Option<Retention> {
        self.periods.get(&frequency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Iterate in frequency order
    pub fn iter(&self) -> impl Iterator<Item = (Frequency, Retention)> + '_ {
        self.periods.iter().map(|(f, r)| (*f, *r))
    }

    /// Reject schemes that would delete every backup
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(RotateError::EmptyScheme);
        }
        self.validate_counts()
    }

    /// Reject zero counts, which could only be built in code
    pub fn validate_counts(&self) -> Result<()> {
        match self.iter().find(|(_, r)| *r == Retention::Count(0)) {
            Some((frequency, _)) => Err(RotateError::InvalidRetention(format!(
                "{frequency}=0: {}",
                count_range()
            ))),
            None => Ok(()),
        }
    }
}

impl FromIterator<(Frequency, Retention)> for RetentionScheme {
    fn from_iter<I: IntoIterator<Item = (Frequency, Retention)>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for RetentionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, (frequency, retention)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{frequency}={retention}")?;
        }
        Ok(())
    }
}
