//! Rotation subjects

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A listed entry handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full path (joined with its location by the lister)
    pub path: String,
    /// Filesystem modification time, when the lister provides one
    pub modified: Option<NaiveDateTime>,
}

impl Candidate {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            modified: None,
        }
    }

    pub fn with_modified(path: impl Into<String>, modified: NaiveDateTime) -> Self {
        Self {
            path: path.into(),
            modified: Some(modified),
        }
    }

    /// Last path component, used for timestamp matching and filtering
    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }
}

impl From<&str> for Candidate {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Candidate {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// A rotation subject: a path and the moment it was created
///
/// Identity (equality and hashing) is the path alone. Ordering is by
/// timestamp first and path second, so two backups taken in the same
/// second stay distinct and sort deterministically.
#[derive(Debug, Clone)]
pub struct Backup {
    path: String,
    timestamp: NaiveDateTime,
}

impl Backup {
    pub fn new(path: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    pub fn day(&self) -> u32 {
        self.timestamp.day()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn minute(&self) -> u32 {
        self.timestamp.minute()
    }

    pub fn second(&self) -> u32 {
        self.timestamp.second()
    }

    /// ISO-8601 week number (1-53)
    pub fn iso_week(&self) -> u32 {
        self.timestamp.iso_week().week()
    }
}

impl PartialEq for Backup {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Backup {}

impl Hash for Backup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for Backup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Backup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl fmt::Display for Backup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

pub(crate) fn file_name_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
