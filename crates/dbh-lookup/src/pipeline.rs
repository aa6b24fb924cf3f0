//! Concurrent lookup pipeline
//!
//! Partitions the candidate set into vendor-sized batches and issues them
//! with pipelining: the next batch's request goes out before the current
//! one's response arrives, bounded by a worker-pool size rather than
//! unbounded fan-out. Batches complete in arrival order; the per-vendor
//! verdict is an order-independent union, so no cross-batch ordering is
//! needed.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{info, warn};

use dbh_common::Hostname;

use crate::vendor::VendorClient;

/// One vendor's verdicts for a run
#[derive(Debug, Clone)]
pub struct VendorVerdicts {
    pub vendor: String,
    /// Hostnames the vendor flagged as malicious
    pub flagged: HashSet<Hostname>,
    pub batches_submitted: usize,
    /// Failed batches: their candidates are unknown, not safe and not
    /// malicious
    pub batches_failed: usize,
}

impl VendorVerdicts {
    /// Whether every batch for this vendor got a response.
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0
    }
}

/// All vendors' verdicts for a run
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub per_vendor: Vec<VendorVerdicts>,
}

impl LookupOutcome {
    /// Union across vendors. Absence of a flag is not evidence of safety,
    /// so union — never intersection — combines vendors.
    pub fn union(&self) -> HashSet<Hostname> {
        let mut combined = HashSet::new();
        for verdicts in &self.per_vendor {
            combined.extend(verdicts.flagged.iter().cloned());
        }
        combined
    }

    pub fn batches_failed(&self) -> usize {
        self.per_vendor.iter().map(|v| v.batches_failed).sum()
    }
}

/// Batched, pipelined reputation lookups against one or more vendors.
pub struct LookupPipeline {
    worker_count: usize,
}

impl LookupPipeline {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    /// Classify the candidate set against every vendor.
    ///
    /// A failing batch is logged and skipped; it aborts neither the
    /// remaining batches for that vendor nor the other vendors. The result
    /// is therefore partial-but-correct rather than all-or-nothing.
    pub async fn classify(
        &self,
        candidates: &[Hostname],
        vendors: &[Box<dyn VendorClient>],
    ) -> LookupOutcome {
        let mut per_vendor = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            per_vendor.push(self.classify_vendor(candidates, vendor.as_ref()).await);
        }
        LookupOutcome { per_vendor }
    }

    async fn classify_vendor(
        &self,
        candidates: &[Hostname],
        vendor: &dyn VendorClient,
    ) -> VendorVerdicts {
        let chunk_size = vendor.max_batch_size().max(1);
        let chunks: Vec<&[Hostname]> = candidates.chunks(chunk_size).collect();
        let batches_submitted = chunks.len();

        let results: Vec<Option<HashSet<Hostname>>> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                match vendor.check_batch(chunk).await {
                    Ok(flagged) => {
                        // A vendor response may only flag hostnames from the
                        // batch it was asked about
                        let submitted: HashSet<&Hostname> = chunk.iter().collect();
                        Some(
                            flagged
                                .into_iter()
                                .filter(|host| submitted.contains(host))
                                .collect::<HashSet<_>>(),
                        )
                    }
                    Err(e) => {
                        warn!(
                            vendor = vendor.name(),
                            batch = index,
                            error = %e,
                            "batch lookup failed; candidates treated as unknown"
                        );
                        None
                    }
                }
            })
            .buffer_unordered(self.worker_count)
            .collect()
            .await;

        let batches_failed = results.iter().filter(|r| r.is_none()).count();
        let flagged: HashSet<Hostname> = results.into_iter().flatten().flatten().collect();

        info!(
            vendor = vendor.name(),
            candidates = candidates.len(),
            batches = batches_submitted,
            failed = batches_failed,
            flagged = flagged.len(),
            "vendor classification complete"
        );

        VendorVerdicts {
            vendor: vendor.name().to_string(),
            flagged,
            batches_submitted,
            batches_failed,
        }
    }
}
