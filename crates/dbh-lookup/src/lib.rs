//! Reputation lookup pipeline
//!
//! Classifies a bounded candidate set of hostnames against external
//! threat-reputation vendors and assembles the final blocklist.
//!
//! # Architecture
//!
//! - **vendor**: the [`VendorClient`](vendor::VendorClient) interface —
//!   one batch in, the flagged subset out
//! - **safebrowsing**: Google and Yandex `threatMatches:find` clients
//! - **pipeline**: batching, bounded pipelining, and per-vendor verdict
//!   collection with batch-level failure isolation
//! - **assembler**: union across vendors cross-referenced against the
//!   candidate set
//!
//! The system never decides maliciousness itself; that judgment is
//! delegated entirely to the vendors.

pub mod assembler;
pub mod error;
pub mod pipeline;
pub mod safebrowsing;
pub mod vendor;

// Re-export main types
pub use assembler::{assemble, Blocklist};
pub use error::{LookupError, Result};
pub use pipeline::{LookupOutcome, LookupPipeline, VendorVerdicts};
pub use safebrowsing::{SafeBrowsingClient, SafeBrowsingVendor, MAX_BATCH_SIZE};
pub use vendor::VendorClient;
