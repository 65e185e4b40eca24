//! Concurrent scan of many repositories
//!
//! Each repository is scanned in its own task, at most `workers` at a time.
//! A task that fails to acquire its repository, or panics, produces a failed
//! [`RepositoryResult`] and never affects the other repositories.

use std::any::Any;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::report::ScanReport;
use crate::scan::fetcher::RepositoryFetcher;
use crate::scan::source::RepositoryId;
use crate::scan::worker::RepositoryScanner;
use crate::version::checker::FreshnessRecord;

/// How a single repository scan ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryStatus {
    Scanned { modules: usize },
    AcquisitionFailed { reason: String },
    Faulted { reason: String },
}

impl RepositoryStatus {
    pub fn is_failure(&self) -> bool {
        !matches!(self, RepositoryStatus::Scanned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryResult {
    pub repository: RepositoryId,
    #[serde(flatten)]
    pub status: RepositoryStatus,
}

pub struct Orchestrator {
    fetcher: Arc<dyn RepositoryFetcher>,
    scanner: Arc<RepositoryScanner>,
    workers: usize,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        scanner: Arc<RepositoryScanner>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            scanner,
            workers: workers.max(1),
        }
    }

    /// Scan every repository and merge the records into one report
    ///
    /// Yields exactly one `RepositoryResult` per input repository.
    pub async fn run(&self, repositories: Vec<RepositoryId>) -> ScanReport {
        let total = repositories.len();
        info!(
            "Scanning {} repositories with {} workers",
            total, self.workers
        );

        let mut outcomes: Vec<(RepositoryResult, Vec<FreshnessRecord>)> =
            stream::iter(repositories)
                .map(|repository| {
                    let fetcher = Arc::clone(&self.fetcher);
                    let scanner = Arc::clone(&self.scanner);
                    async move {
                        let task = tokio::spawn(scan_repository(
                            fetcher,
                            scanner,
                            repository.clone(),
                        ));
                        let (status, records) = match task.await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                let reason = fault_reason(e);
                                error!("Scan of {} faulted: {}", repository, reason);
                                (RepositoryStatus::Faulted { reason }, Vec::new())
                            }
                        };
                        (RepositoryResult { repository, status }, records)
                    }
                })
                .buffer_unordered(self.workers)
                .collect()
                .await;

        outcomes.sort_by(|(a, _), (b, _)| a.repository.cmp(&b.repository));

        let failed = outcomes.iter().filter(|(r, _)| r.status.is_failure()).count();
        info!(
            "Finished scanning {} repositories ({} failed)",
            total, failed
        );

        let mut repositories = Vec::with_capacity(outcomes.len());
        let mut records = Vec::new();
        for (result, repository_records) in outcomes {
            repositories.push(result);
            records.extend(repository_records);
        }

        ScanReport::new(records, repositories)
    }
}

async fn scan_repository(
    fetcher: Arc<dyn RepositoryFetcher>,
    scanner: Arc<RepositoryScanner>,
    repository: RepositoryId,
) -> (RepositoryStatus, Vec<FreshnessRecord>) {
    let working_copy = match fetcher.fetch(&repository).await {
        Ok(working_copy) => working_copy,
        Err(e) => {
            warn!("Skipping {}: {}", repository, e);
            return (
                RepositoryStatus::AcquisitionFailed {
                    reason: e.to_string(),
                },
                Vec::new(),
            );
        }
    };

    let records = scanner
        .scan(&repository.to_string(), working_copy.path())
        .await;

    // Removing a checkout blocks on the file system
    if let Err(e) = tokio::task::spawn_blocking(move || drop(working_copy)).await {
        warn!("Failed to release working copy of {}: {}", repository, e);
    }
    (
        RepositoryStatus::Scanned {
            modules: records.len(),
        },
        records,
    )
}

fn fault_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return "scan task was cancelled".to_string();
    }
    let payload: Box<dyn Any + Send> = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
