//! Backup rotation engine
//!
//! This crate provides:
//! - Timestamp extraction from backup names (default and custom patterns)
//! - Retention schemes per frequency (minutely through yearly)
//! - Include/exclude filename filtering
//! - Bucket grouping, representative selection and retention windows
//! - Preserve/delete decisions with the frequencies that justified them
//!
//! Nothing in here touches the filesystem: listing candidates and running
//! the removal commands is up to the caller.

pub mod backup;
pub mod engine;
pub mod error;
pub mod expr;
pub mod filter;
pub mod frequency;
pub mod removal;
pub mod scheme;
pub mod timestamp;

// Re-exports
pub use backup::{Backup, Candidate};
pub use engine::{
    apply_rotation_scheme, describe_reasons, find_preservation_criteria, group_backups, Action,
    BackupGroups, Decision, PreservationMap, RetainedBuckets, RotationOptions, RotationPlan,
    Rotator,
};
pub use error::{Result, RotateError};
pub use filter::{FilenameFilter, FilterVerdict};
pub use frequency::{BucketKey, BucketWidth, Frequency, ORDERED_FREQUENCIES};
pub use removal::{IoSchedulingClass, RemovalCommand, DEFAULT_REMOVAL_COMMAND};
pub use scheme::{Retention, RetentionScheme};
pub use timestamp::{TimestampPattern, DEFAULT_TIMESTAMP_PATTERN};
