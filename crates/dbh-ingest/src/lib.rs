//! Feed ingestion framework
//!
//! Harvests candidate domain names from heterogeneous external feeds into a
//! local SQLite store, one bounded batch at a time.
//!
//! # Architecture
//!
//! - **decoder**: incremental gzip decompression + line reassembly for
//!   streaming zone files
//! - **auth**: bearer-token lifecycle for token-gated feeds
//! - **source**: the [`FeedSource`](source::FeedSource) interface
//!   (`discover` / `run`) every origin implements
//! - **sources**: concrete feeds (icann, whois, domainsproject, tranco)
//!   and the registry assembling them from configuration
//! - **store**: per-feed partitions with idempotent batch upserts
//! - **scheduler**: bounded-concurrency job execution with per-job failure
//!   isolation and a run summary
//!
//! Each job owns its decoder context, pending-line buffer and credential;
//! the store is the only shared resource, and batch-scoped idempotent
//! upserts make concurrent writers safe without external locking.

pub mod auth;
pub mod config;
pub mod decoder;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod sources;
pub mod store;

// Re-export main types
pub use auth::{AuthCredential, TokenAuthSession};
pub use config::IngestConfig;
pub use decoder::GzipLineDecoder;
pub use error::{IngestError, Result};
pub use scheduler::{IngestionScheduler, JobOutcome, RunSummary};
pub use source::{BatchStream, FeedJob, FeedSource, HostnameBatch};
pub use sources::registry;
pub use store::FeedStore;
