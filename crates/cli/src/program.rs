//! Rotation of one or more locations
//!
//! `RotateBackups` carries the command line settings. For every location it
//! applies the matching configuration section, checks the location, plans
//! the rotation with the core engine and then runs, logs or returns the
//! deletions.

use crate::config::{Config, ConfiguredLocation};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use location::{Deletion, DeletionPool, Location};
use rotate_core::{Action, RetentionScheme, RotationOptions, RotationPlan, Rotator};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Settings for rotating one location, after configuration overrides
#[derive(Debug, Clone)]
pub struct LocationSettings {
    pub location: Location,
    pub scheme: RetentionScheme,
    pub options: RotationOptions,
    pub recursive: bool,
}

/// Decisions for one location, computed before anything is deleted
#[derive(Debug, Clone)]
pub struct PreparedRotation {
    pub location: Location,
    pub plan: RotationPlan,
}

impl PreparedRotation {
    pub fn deletion_count(&self) -> usize {
        self.plan.deletions().count()
    }
}

/// What happened to one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationSummary {
    pub location: String,
    pub preserved: usize,
    pub deleted: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RotateBackups {
    scheme: RetentionScheme,
    options: RotationOptions,
    recursive: bool,
    dry_run: bool,
    force: bool,
    config: Config,
}

impl RotateBackups {
    pub fn new(scheme: RetentionScheme, options: RotationOptions, config: Config) -> Self {
        Self {
            scheme,
            options,
            recursive: false,
            dry_run: false,
            force: false,
            config,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Merge the command line settings with the location's configuration
    ///
    /// A section replaces the scheme when it defines one and every option it
    /// sets. Its location brings along `use-sudo` and `ssh-user`.
    pub fn settings_for(&self, location: &Location) -> LocationSettings {
        match self.config.find(location) {
            Some(section) => {
                debug!(
                    "Loading custom configuration for location {} from {}",
                    location,
                    section.source.display()
                );
                self.apply_section(location, section)
            }
            None => {
                debug!("No configuration found for location {}", location);
                LocationSettings {
                    location: location.clone(),
                    scheme: self.scheme.clone(),
                    options: self.options.clone(),
                    recursive: self.recursive,
                }
            }
        }
    }

    fn apply_section(&self, location: &Location, section: &ConfiguredLocation) -> LocationSettings {
        let overrides = &section.overrides;
        let mut options = self.options.clone();

        if let Some(include) = &overrides.include {
            options.include = include.clone();
        }
        if let Some(exclude) = &overrides.exclude {
            options.exclude = exclude.clone();
        }
        if let Some(strict) = overrides.strict {
            options.strict = strict;
        }
        if let Some(prefer_recent) = overrides.prefer_recent {
            options.prefer_recent = prefer_recent;
        }
        if let Some(stat_timestamp) = overrides.stat_timestamp {
            options.stat_timestamp = stat_timestamp;
        }
        if let Some(pattern) = &overrides.timestamp_pattern {
            options.timestamp_pattern = pattern.clone();
        }

        let io_class = overrides
            .io_class
            .or(options.removal_command.io_class());
        let command = overrides
            .removal_command
            .clone()
            .unwrap_or_else(|| options.removal_command.clone());
        options.removal_command = command.with_io_class(io_class);

        let scheme = if section.scheme.is_empty() {
            self.scheme.clone()
        } else {
            section.scheme.clone()
        };

        // Keep the queried directory, globs match many
        let location = Location::new(
            section.location.context().clone(),
            location.directory().to_string(),
        );

        LocationSettings {
            location,
            scheme,
            options,
            recursive: overrides.recursive.unwrap_or(self.recursive),
        }
    }

    /// Plan the rotation of one location without deleting anything
    pub async fn prepare(&self, location: &Location) -> Result<PreparedRotation> {
        let settings = self.settings_for(location);
        let location = settings.location;

        info!("Scanning {} for backups", location);
        location.ensure_readable().await?;

        let candidates = location
            .list_entries(settings.recursive, settings.options.stat_timestamp)
            .await
            .with_context(|| format!("Failed to list backups in {}", location))?;

        let needs_writable = !self.dry_run
            && !self.force
            && settings.options.removal_command.is_default();
        let rotator = Rotator::new(settings.scheme, settings.options)?;
        let plan = rotator.rotate(candidates)?;

        if plan.nothing_found() {
            info!("No backups found in {}", location);
        } else if needs_writable {
            location.ensure_writable().await?;
        }

        Ok(PreparedRotation { location, plan })
    }

    /// Rotate one location, deleting one backup at a time
    ///
    /// Stops at the first failed deletion.
    pub async fn rotate(&self, location: &Location) -> Result<RotationSummary> {
        let prepared = self.prepare(location).await?;

        for decision in prepared.plan.deletions() {
            let Action::Delete(argv) = &decision.action else {
                continue;
            };
            info!("Deleting {}", decision.backup);
            if self.dry_run {
                continue;
            }
            let started = Instant::now();
            prepared
                .location
                .context()
                .execute(argv)
                .await
                .with_context(|| format!("Failed to delete {}", decision.backup))?;
            debug!("Deleted {} in {:?}", decision.backup, started.elapsed());
        }

        Ok(self.summarize(&prepared))
    }

    /// Rotate several locations with deletions running concurrently
    ///
    /// Every location is planned first; nothing is deleted if any of them
    /// fails to plan. Deletions on the same disk run one at a time.
    pub async fn rotate_concurrent(
        &self,
        locations: &[Location],
        pool: &DeletionPool,
        show_progress: bool,
    ) -> Result<Vec<RotationSummary>> {
        let mut prepared = Vec::with_capacity(locations.len());
        for location in locations {
            prepared.push(self.prepare(location).await?);
        }

        let mut deletions = Vec::new();
        for rotation in &prepared {
            if rotation.deletion_count() == 0 {
                continue;
            }
            let group = rotation.location.affinity_key().await;
            debug!("Deletions in {} are grouped under {}", rotation.location, group);
            for decision in rotation.plan.deletions() {
                info!("Deleting {}", decision.backup);
                if let Action::Delete(argv) = &decision.action {
                    deletions.push(Deletion {
                        group: group.clone(),
                        context: rotation.location.context().clone(),
                        argv: argv.clone(),
                        label: decision.backup.path().to_string(),
                    });
                }
            }
        }

        if !self.dry_run && !deletions.is_empty() {
            run_with_progress(pool, deletions, show_progress).await?;
        }

        Ok(prepared.iter().map(|p| self.summarize(p)).collect())
    }

    fn summarize(&self, prepared: &PreparedRotation) -> RotationSummary {
        let deleted = prepared.deletion_count();
        if !prepared.plan.nothing_found() && deleted == 0 {
            info!("Nothing to do! (all backups preserved)");
        }
        RotationSummary {
            location: prepared.location.to_string(),
            preserved: prepared.plan.len() - deleted,
            deleted,
            dry_run: self.dry_run,
        }
    }
}

async fn run_with_progress(
    pool: &DeletionPool,
    deletions: Vec<Deletion>,
    show_progress: bool,
) -> Result<()> {
    let total = deletions.len();
    let bar = if show_progress {
        ProgressBar::new(total as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<location::DeletionReport>();
    let progress = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                bar.inc(1);
                bar.set_message(report.label);
            }
        })
    };

    let failures = pool.run(deletions, Some(tx)).await;
    // The pool dropped every sender, so the progress task ends on its own
    let _ = progress.await;
    bar.finish_and_clear();

    if failures.is_empty() {
        return Ok(());
    }
    for failure in &failures {
        error!("Failed to delete {}: {}", failure.label, failure.error);
    }
    anyhow::bail!("{} of {} deletions failed", failures.len(), total)
}
