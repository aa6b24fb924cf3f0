//! Ingestion scheduler
//!
//! Enumerates every configured feed's jobs, drains them with bounded
//! concurrency into the store, and isolates per-job failures: one job
//! failing mid-drain keeps its already-committed batches, is reported in
//! the run summary, and never aborts sibling jobs or the run.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::Result;
use crate::source::{FeedJob, FeedSource};
use crate::store::FeedStore;

/// Outcome of one drained job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub origin: String,
    pub target: String,
    /// Batches committed to the store
    pub batches: usize,
    /// Hostnames across those batches (pre-upsert, so duplicates across
    /// batches may collapse in the store)
    pub hostnames: usize,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-run report of what succeeded, failed, or was skipped
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<JobOutcome>,
    /// Feeds whose discovery failed outright (source name, error)
    pub discovery_failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded() + self.discovery_failures.len()
    }

    pub fn total_hostnames(&self) -> usize {
        self.outcomes.iter().map(|o| o.hostnames).sum()
    }

    pub fn report(&self) -> String {
        let mut lines = vec![format!(
            "Ingestion summary: {} jobs succeeded, {} failed, {} hostnames committed",
            self.succeeded(),
            self.failed(),
            self.total_hostnames()
        )];
        for outcome in &self.outcomes {
            match &outcome.error {
                None => lines.push(format!(
                    "  ok   {}/{}: {} batches, {} hostnames",
                    outcome.origin, outcome.target, outcome.batches, outcome.hostnames
                )),
                Some(err) => lines.push(format!(
                    "  FAIL {}/{} after {} batches: {}",
                    outcome.origin, outcome.target, outcome.batches, err
                )),
            }
        }
        for (source, err) in &self.discovery_failures {
            lines.push(format!("  FAIL {source} (discovery): {err}"));
        }
        lines.join("\n")
    }
}

/// Drives all discovered feed jobs into the store.
pub struct IngestionScheduler {
    store: FeedStore,
    max_concurrent: usize,
    retention_days: Option<i64>,
}

impl IngestionScheduler {
    pub fn new(store: FeedStore, max_concurrent: usize, retention_days: Option<i64>) -> Self {
        Self {
            store,
            max_concurrent: max_concurrent.max(1),
            retention_days,
        }
    }

    /// Execute one full ingestion run across the given sources.
    ///
    /// Discovery failures and job failures are contained and reported; this
    /// method itself never fails.
    pub async fn run(&self, sources: &[Box<dyn FeedSource>]) -> RunSummary {
        let started_at = Utc::now();
        let mut summary = RunSummary {
            started_at,
            outcomes: Vec::new(),
            discovery_failures: Vec::new(),
        };

        let mut work: Vec<(&dyn FeedSource, FeedJob)> = Vec::new();
        for source in sources {
            match source.discover().await {
                Ok(jobs) if jobs.is_empty() => {
                    info!(source = source.name(), "feed discovered no accessible jobs");
                }
                Ok(jobs) => {
                    info!(source = source.name(), count = jobs.len(), "feed jobs discovered");
                    work.extend(jobs.into_iter().map(|job| (source.as_ref(), job)));
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "feed discovery failed");
                    summary
                        .discovery_failures
                        .push((source.name().to_string(), e.to_string()));
                }
            }
        }

        summary.outcomes = stream::iter(work)
            .map(|(source, job)| self.drive_job(source, job, started_at))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        self.apply_retention(&summary).await;

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            hostnames = summary.total_hostnames(),
            "ingestion run complete"
        );
        summary
    }

    /// Drain one job's batch stream into its store partition.
    async fn drive_job(
        &self,
        source: &dyn FeedSource,
        job: FeedJob,
        seen_at: DateTime<Utc>,
    ) -> JobOutcome {
        let mut outcome = JobOutcome {
            origin: job.origin.clone(),
            target: job.target.clone(),
            batches: 0,
            hostnames: 0,
            error: None,
        };

        let mut batches = match source.run(&job).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(origin = %job.origin, target = %job.target, error = %e, "feed job failed to start");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        while let Some(next) = batches.next().await {
            let result: Result<()> = async {
                let batch = next?;
                if !batch.is_empty() {
                    self.store.upsert_batch(&job.target, &batch, seen_at).await?;
                    outcome.batches += 1;
                    outcome.hostnames += batch.len();
                }
                Ok(())
            }
            .await;

            if let Err(e) = result {
                warn!(
                    origin = %job.origin,
                    target = %job.target,
                    committed = outcome.batches,
                    error = %e,
                    "feed job failed mid-drain"
                );
                outcome.error = Some(e.to_string());
                return outcome;
            }
        }

        info!(
            origin = %job.origin,
            target = %job.target,
            batches = outcome.batches,
            hostnames = outcome.hostnames,
            "feed job complete"
        );
        outcome
    }

    /// Prune entries older than the retention threshold from partitions
    /// that completed successfully this run.
    async fn apply_retention(&self, summary: &RunSummary) {
        let Some(days) = self.retention_days else {
            return;
        };
        let cutoff = summary.started_at - chrono::Duration::days(days);

        for outcome in summary.outcomes.iter().filter(|o| o.is_success()) {
            match self.store.prune(&outcome.target, cutoff).await {
                Ok(0) => {}
                Ok(removed) => {
                    info!(target = %outcome.target, removed, "pruned expired entries")
                }
                Err(e) => warn!(target = %outcome.target, error = %e, "prune failed"),
            }
        }
    }
}
