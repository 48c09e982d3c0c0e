//! Error types for rotation

use thiserror::Error;

/// Errors raised while configuring or computing a rotation
///
/// All of these are configuration errors: they surface before any backup is
/// touched. Names that fail to parse are not errors, they are skipped.
#[derive(Debug, Error)]
pub enum RotateError {
    /// The scheme has no frequencies, so every backup would be deleted
    #[error("Refusing to use empty rotation scheme! (all backups would be deleted)")]
    EmptyScheme,

    /// A retention value is neither a count, an expression nor `always`
    #[error("Invalid retention period! ({0})")]
    InvalidRetention(String),

    /// Unknown frequency name
    #[error("Unknown rotation frequency: {0:?} (expected minutely, hourly, daily, weekly, monthly or yearly)")]
    UnknownFrequency(String),

    /// Unknown `ionice` class
    #[error("Invalid I/O scheduling class! (got {0:?} while valid options are idle, best-effort and realtime)")]
    InvalidIoClass(String),

    /// An include/exclude pattern could not be compiled
    #[error("Invalid filename pattern {pattern:?}: {source}")]
    InvalidFilenamePattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    /// An include/exclude pattern uses gitignore syntax that never fits a file name
    #[error("Unsupported filename pattern {pattern:?}: {reason}")]
    UnsupportedFilenamePattern {
        pattern: String,
        reason: &'static str,
    },

    /// A custom timestamp pattern is not a valid regular expression
    #[error("Invalid timestamp pattern: {0}")]
    InvalidTimestampPattern(#[from] regex::Error),

    /// A custom timestamp pattern lacks one of the mandatory capture groups
    #[error("Timestamp pattern is missing the required capture group '{0}'")]
    MissingCaptureGroup(&'static str),

    /// The removal command has no program to run
    #[error("Removal command can't be empty")]
    EmptyRemovalCommand,
}

/// Result type for rotation operations
pub type Result<T> = std::result::Result<T, RotateError>;
