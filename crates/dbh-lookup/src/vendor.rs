//! Vendor client interface
//!
//! The pipeline is vendor-agnostic: a client accepts one batch of
//! hostnames and returns the subset the vendor flagged. Unflagged
//! hostnames are simply absent from the result — absence carries no
//! signal either way.

use async_trait::async_trait;
use std::collections::HashSet;

use dbh_common::Hostname;

use crate::error::Result;

/// A reputation vendor's batched lookup API.
#[async_trait]
pub trait VendorClient: Send + Sync {
    /// Vendor name used in reports and output filenames.
    fn name(&self) -> &str;

    /// The vendor's documented per-request batch ceiling.
    fn max_batch_size(&self) -> usize;

    /// Look up one batch and return the flagged subset.
    async fn check_batch(&self, batch: &[Hostname]) -> Result<HashSet<Hostname>>;
}
