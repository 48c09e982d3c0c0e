//! Concurrent deletion pool
//!
//! Deletions are grouped by affinity key. Each group runs its deletions one
//! after the other while groups run side by side, bounded by a shared
//! semaphore.

use crate::context::CommandContext;
use crate::error::LocationError;
use crate::location::AffinityKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// One prepared removal
#[derive(Debug, Clone)]
pub struct Deletion {
    pub group: AffinityKey,
    pub context: CommandContext,
    pub argv: Vec<String>,
    /// Shown in logs and progress output
    pub label: String,
}

/// Sent for every finished deletion, successful or not
#[derive(Debug, Clone)]
pub struct DeletionReport {
    pub label: String,
    pub elapsed: Duration,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DeletionFailure {
    pub label: String,
    pub error: LocationError,
}

#[derive(Debug, Clone)]
pub struct DeletionPool {
    concurrency: usize,
}

impl DeletionPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every deletion and collect the failures
    ///
    /// A failure ends nothing but its own deletion. Reports are sent when a
    /// receiver is attached; a dropped receiver is ignored.
    pub async fn run(
        &self,
        deletions: Vec<Deletion>,
        reports: Option<mpsc::UnboundedSender<DeletionReport>>,
    ) -> Vec<DeletionFailure> {
        let groups = group_in_order(deletions);
        debug!(
            "Running deletions in {} group(s) with {} worker(s)",
            groups.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (group, deletions) in groups {
            let semaphore = Arc::clone(&semaphore);
            let reports = reports.clone();
            tasks.spawn(async move {
                let mut failures = Vec::new();
                for deletion in deletions {
                    // The semaphore is never closed
                    let Ok(_permit) = semaphore.acquire().await else {
                        break;
                    };
                    debug!("Deleting {} (group {})", deletion.label, group);

                    let started = Instant::now();
                    let result = deletion.context.execute(&deletion.argv).await;
                    let report = DeletionReport {
                        label: deletion.label.clone(),
                        elapsed: started.elapsed(),
                        error: result.as_ref().err().map(ToString::to_string),
                    };
                    if let Some(reports) = &reports {
                        let _ = reports.send(report);
                    }

                    if let Err(error) = result {
                        warn!("Failed to delete {}: {}", deletion.label, error);
                        failures.push(DeletionFailure {
                            label: deletion.label,
                            error,
                        });
                    }
                }
                failures
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(group_failures) => failures.extend(group_failures),
                Err(err) => warn!("Deletion worker panicked: {}", err),
            }
        }
        failures
    }
}

impl Default for DeletionPool {
    fn default() -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(concurrency)
    }
}

/// Group deletions by key, keeping first-seen group order and input order
fn group_in_order(deletions: Vec<Deletion>) -> Vec<(AffinityKey, Vec<Deletion>)> {
    let mut index: HashMap<AffinityKey, usize> = HashMap::new();
    let mut groups: Vec<(AffinityKey, Vec<Deletion>)> = Vec::new();

    for deletion in deletions {
        match index.get(&deletion.group) {
            Some(&i) => groups[i].1.push(deletion),
            None => {
                index.insert(deletion.group.clone(), groups.len());
                groups.push((deletion.group.clone(), vec![deletion]));
            }
        }
    }

    groups
}
