//! Rotation engine
//!
//! A rotation run is a pure pipeline:
//!
//! 1. `collect`: timestamp and filter candidates, sort by `(timestamp, path)`
//! 2. `group_backups`: bucket every backup for every frequency
//! 3. `apply_rotation_scheme`: one representative per bucket, then trim the
//!    buckets to the retention window and count
//! 4. `find_preservation_criteria`: which frequencies keep which backup
//!
//! `Rotator::rotate` chains the steps and turns the result into one decision
//! per collected backup. Decisions are complete before anything is deleted.

use crate::backup::{Backup, Candidate};
use crate::error::Result;
use crate::filter::{FilenameFilter, FilterVerdict};
use crate::frequency::{BucketKey, Frequency, ORDERED_FREQUENCIES};
use crate::removal::RemovalCommand;
use crate::scheme::{Retention, RetentionScheme};
use crate::timestamp::TimestampPattern;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Options for one rotation run
#[derive(Debug, Clone)]
pub struct RotationOptions {
    /// Enforce the time window of each frequency in addition to its count
    pub strict: bool,
    /// Keep the newest backup of each bucket instead of the oldest
    pub prefer_recent: bool,
    /// File name patterns that must match (when non-empty)
    pub include: Vec<String>,
    /// File name patterns that exclude a backup from rotation
    pub exclude: Vec<String>,
    /// Use the filesystem modification time instead of the name
    pub stat_timestamp: bool,
    pub timestamp_pattern: TimestampPattern,
    pub removal_command: RemovalCommand,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            strict: true,
            prefer_recent: false,
            include: Vec::new(),
            exclude: Vec::new(),
            stat_timestamp: false,
            timestamp_pattern: TimestampPattern::default(),
            removal_command: RemovalCommand::default(),
        }
    }
}

/// Backups grouped per frequency and bucket, in chronological order
#[derive(Debug, Clone)]
pub struct BackupGroups<'a> {
    buckets: BTreeMap<Frequency, BTreeMap<BucketKey, Vec<&'a Backup>>>,
}

impl<'a> BackupGroups<'a> {
    /// Buckets for one frequency, ordered by key
    pub fn buckets(&self, frequency: Frequency) -> &BTreeMap<BucketKey, Vec<&'a Backup>> {
        // Every frequency is populated by `group_backups`
        &self.buckets[&frequency]
    }

    pub fn bucket_count(&self, frequency: Frequency) -> usize {
        self.buckets(frequency).len()
    }
}

/// Surviving buckets after a scheme is applied, one representative each
#[derive(Debug, Clone, Default)]
pub struct RetainedBuckets<'a> {
    representatives: BTreeMap<Frequency, BTreeMap<BucketKey, &'a Backup>>,
}

impl<'a> RetainedBuckets<'a> {
    /// Representatives kept for `frequency`, oldest bucket first
    pub fn representatives(&self, frequency: Frequency) -> Vec<&'a Backup> {
        self.representatives
            .get(&frequency)
            .map(|buckets| buckets.values().copied().collect())
            .unwrap_or_default()
    }
}

/// Backups to preserve and the frequencies that justified each one
#[derive(Debug, Clone, Default)]
pub struct PreservationMap<'a> {
    reasons: HashMap<&'a Backup, Vec<Frequency>>,
}

impl<'a> PreservationMap<'a> {
    /// Reasons in evaluation order (smallest bucket width first)
    pub fn reasons(&self, backup: &Backup) -> Option<&[Frequency]> {
        self.reasons.get(backup).map(Vec::as_slice)
    }

    pub fn contains(&self, backup: &Backup) -> bool {
        self.reasons.contains_key(backup)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// What happens to one backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Kept; never empty
    Preserve(Vec<Frequency>),
    /// Removed by running this argument vector
    Delete(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub backup: Backup,
    pub action: Action,
}

impl Decision {
    pub fn is_preserved(&self) -> bool {
        matches!(self.action, Action::Preserve(_))
    }

    pub fn removal_argv(&self) -> Option<&[String]> {
        match &self.action {
            Action::Delete(argv) => Some(argv),
            Action::Preserve(_) => None,
        }
    }
}

/// Decisions for every collected backup, in `(timestamp, path)` order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    decisions: Vec<Decision>,
}

impl RotationPlan {
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// No timestamped backups survived collection
    pub fn nothing_found(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Every collected backup is preserved
    pub fn nothing_to_do(&self) -> bool {
        self.decisions.iter().all(Decision::is_preserved)
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| !d.is_preserved())
    }

    pub fn preserved(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| d.is_preserved())
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Bucket every backup for every supported frequency
///
/// Each backup lands in exactly one bucket per frequency. Within a bucket the
/// input order is kept, so sorted input gives chronological buckets.
pub fn group_backups(backups: &[Backup]) -> BackupGroups<'_> {
    let mut buckets: BTreeMap<Frequency, BTreeMap<BucketKey, Vec<&Backup>>> = ORDERED_FREQUENCIES
        .into_iter()
        .map(|frequency| (frequency, BTreeMap::new()))
        .collect();

    for backup in backups {
        for (frequency, by_key) in buckets.iter_mut() {
            by_key
                .entry(frequency.bucket_key(backup))
                .or_default()
                .push(backup);
        }
    }

    BackupGroups { buckets }
}

/// Reduce and trim the groups according to `scheme`
///
/// Frequencies missing from the scheme retain nothing. Every bucket is
/// reduced to its oldest backup (newest with `prefer_recent`). With a finite
/// count, `strict` first drops buckets whose representative is older than
/// `most_recent` minus `count` bucket widths; then only the `count` buckets
/// with the highest keys survive.
///
/// Fails on an empty scheme before looking at any bucket.
pub fn apply_rotation_scheme<'a>(
    groups: &BackupGroups<'a>,
    most_recent: NaiveDateTime,
    scheme: &RetentionScheme,
    strict: bool,
    prefer_recent: bool,
) -> Result<RetainedBuckets<'a>> {
    scheme.validate()?;

    let mut representatives = BTreeMap::new();

    for frequency in ORDERED_FREQUENCIES {
        let Some(retention) = scheme.get(frequency) else {
            continue;
        };

        let mut kept: BTreeMap<BucketKey, &'a Backup> = groups
            .buckets(frequency)
            .iter()
            .filter_map(|(key, backups)| {
                let chosen = if prefer_recent {
                    backups.iter().max()
                } else {
                    backups.iter().min()
                };
                chosen.map(|backup| (*key, *backup))
            })
            .collect();

        if let Retention::Count(count) = retention {
            if strict {
                if let Some(cutoff) = frequency.window_start(most_recent, count) {
                    kept.retain(|key, backup| {
                        let inside = backup.timestamp() >= cutoff;
                        if !inside {
                            debug!(
                                "Dropping {} bucket {:?} ({} is before {})",
                                frequency,
                                key,
                                backup.path(),
                                cutoff
                            );
                        }
                        inside
                    });
                }
            }

            let excess = kept.len().saturating_sub(count as usize);
            if excess > 0 {
                kept = kept.into_iter().skip(excess).collect();
            }
        }

        representatives.insert(frequency, kept);
    }

    Ok(RetainedBuckets { representatives })
}

/// Collect the frequencies that preserve each surviving representative
pub fn find_preservation_criteria<'a>(retained: &RetainedBuckets<'a>) -> PreservationMap<'a> {
    let mut reasons: HashMap<&'a Backup, Vec<Frequency>> = HashMap::new();

    for frequency in ORDERED_FREQUENCIES {
        for backup in retained.representatives(frequency) {
            reasons.entry(backup).or_default().push(frequency);
        }
    }

    PreservationMap { reasons }
}

/// Human readable reason list: `'daily' and 'weekly' retention periods`
pub fn describe_reasons(reasons: &[Frequency]) -> String {
    let quoted: Vec<String> = reasons.iter().map(|f| format!("'{}'", f)).collect();
    let joined = match quoted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    };
    let noun = if reasons.len() == 1 { "period" } else { "periods" };
    format!("{} retention {}", joined, noun)
}

/// Rotation of one set of candidates under one scheme
#[derive(Debug, Clone)]
pub struct Rotator {
    scheme: RetentionScheme,
    options: RotationOptions,
    filter: FilenameFilter,
}

impl Rotator {
    /// Compile the filename filter and reject zero counts
    ///
    /// An empty scheme is checked when applied.
    pub fn new(scheme: RetentionScheme, options: RotationOptions) -> Result<Self> {
        scheme.validate_counts()?;
        let filter = FilenameFilter::new(&options.include, &options.exclude)?;
        Ok(Self {
            scheme,
            options,
            filter,
        })
    }

    pub fn scheme(&self) -> &RetentionScheme {
        &self.scheme
    }

    pub fn options(&self) -> &RotationOptions {
        &self.options
    }

    /// Timestamp and filter candidates
    ///
    /// Unmatched names, invalid dates and filtered names are skipped with a
    /// debug diagnostic. The result is sorted by `(timestamp, path)`.
    pub fn collect<I>(&self, candidates: I) -> Vec<Backup>
    where
        I: IntoIterator,
        I::Item: Into<Candidate>,
    {
        let mut backups = Vec::new();

        for candidate in candidates {
            let candidate: Candidate = candidate.into();
            let file_name = candidate.file_name();

            let timestamp = if self.options.stat_timestamp {
                candidate.modified
            } else {
                self.options.timestamp_pattern.extract(file_name)
            };
            let Some(timestamp) = timestamp else {
                debug!("Failed to match time stamp in filename: {}", candidate.path);
                continue;
            };

            match self.filter.verdict(file_name) {
                FilterVerdict::Excluded => {
                    debug!("Excluded {} (it matched the exclude list)", candidate.path);
                }
                FilterVerdict::NotIncluded => {
                    debug!("Excluded {} (it didn't match the include list)", candidate.path);
                }
                FilterVerdict::Accepted => backups.push(Backup::new(candidate.path, timestamp)),
            }
        }

        backups.sort();
        backups.dedup();
        backups
    }

    pub fn apply_scheme<'a>(
        &self,
        groups: &BackupGroups<'a>,
        most_recent: NaiveDateTime,
    ) -> Result<RetainedBuckets<'a>> {
        apply_rotation_scheme(
            groups,
            most_recent,
            &self.scheme,
            self.options.strict,
            self.options.prefer_recent,
        )
    }

    /// Decide the fate of every candidate
    ///
    /// An empty plan means nothing was found; see `RotationPlan::nothing_to_do`
    /// for the all-preserved case. An empty scheme is only an error when
    /// there is something to rotate.
    pub fn rotate<I>(&self, candidates: I) -> Result<RotationPlan>
    where
        I: IntoIterator,
        I::Item: Into<Candidate>,
    {
        let backups = self.collect(candidates);
        let Some(most_recent) = backups.last().map(Backup::timestamp) else {
            return Ok(RotationPlan::default());
        };

        info!("Found {} timestamped backups", backups.len());

        let groups = group_backups(&backups);
        let retained = self.apply_scheme(&groups, most_recent)?;
        let preserve = find_preservation_criteria(&retained);

        let decisions = backups
            .iter()
            .map(|backup| {
                let action = match preserve.reasons(backup) {
                    Some(reasons) => {
                        info!("Preserving {} (matches {})", backup, describe_reasons(reasons));
                        Action::Preserve(reasons.to_vec())
                    }
                    None => Action::Delete(self.options.removal_command.argv_for(backup)),
                };
                Decision {
                    backup: backup.clone(),
                    action,
                }
            })
            .collect();

        Ok(RotationPlan { decisions })
    }
}
