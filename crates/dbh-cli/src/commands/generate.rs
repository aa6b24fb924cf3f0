//! `dbh generate` - classify candidates and write blocklist files
//!
//! The candidate set is either the N least-popular entries of the ranking
//! whitelist (the default, mirroring a quick verification run) or the full
//! persisted store. Empty blocklist files are not written; the publishing
//! collaborator skips unchanged content anyway.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use dbh_common::Hostname;
use dbh_ingest::sources::TrancoSource;
use dbh_ingest::{FeedStore, IngestConfig};
use dbh_lookup::{
    assemble, Blocklist, LookupPipeline, SafeBrowsingClient, SafeBrowsingVendor, VendorClient,
};

use crate::error::{CliError, Result};

pub async fn run(limit: usize, from_store: bool, output_dir: &str) -> Result<()> {
    let config = IngestConfig::from_env();

    let candidates = if from_store {
        store_candidates(&config).await?
    } else {
        ranking_candidates(&config, limit).await?
    };
    if candidates.is_empty() {
        return Err(CliError::Config(
            "candidate set is empty; run `dbh update` first or raise --limit".to_string(),
        ));
    }
    info!(candidates = candidates.len(), "candidate set assembled");

    let vendors = vendor_clients_from_env()?;
    let workers = std::env::var("DBH_LOOKUP_WORKERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8);

    let pipeline = LookupPipeline::new(workers);
    let outcome = pipeline.classify(&candidates, &vendors).await;
    let blocklist = assemble(&candidates, &outcome);

    write_blocklists(Path::new(output_dir), &blocklist)?;

    println!(
        "Classified {} candidates: {} flagged malicious ({:.2}%)",
        blocklist.candidate_count,
        blocklist.combined.len(),
        blocklist.flagged_fraction() * 100.0
    );
    for verdicts in &outcome.per_vendor {
        let completeness = if verdicts.is_complete() {
            "complete".to_string()
        } else {
            format!(
                "partial: {}/{} batches failed",
                verdicts.batches_failed, verdicts.batches_submitted
            )
        };
        println!(
            "  {}: {} flagged ({})",
            verdicts.vendor,
            verdicts.flagged.len(),
            completeness
        );
    }
    Ok(())
}

/// The N least-popular entries of the ranking whitelist.
async fn ranking_candidates(config: &IngestConfig, limit: usize) -> Result<Vec<Hostname>> {
    let tranco = TrancoSource::new(config.tranco.clone())?;
    let ranking = tranco.fetch_ranking().await?;
    let start = ranking.len().saturating_sub(limit);
    Ok(ranking[start..].to_vec())
}

/// The full persisted store, deduplicated across partitions.
async fn store_candidates(config: &IngestConfig) -> Result<Vec<Hostname>> {
    let store = FeedStore::connect(&config.database_url).await?;
    let mut candidates: BTreeSet<Hostname> = BTreeSet::new();
    for partition in store.partitions().await? {
        candidates.extend(store.snapshot(&partition).await?);
    }
    Ok(candidates.into_iter().collect())
}

/// Build one Safe Browsing client per configured API key.
fn vendor_clients_from_env() -> Result<Vec<Box<dyn VendorClient>>> {
    let mut vendors: Vec<Box<dyn VendorClient>> = Vec::new();
    if let Ok(key) = std::env::var("GOOGLE_SAFE_BROWSING_API_KEY") {
        vendors.push(Box::new(SafeBrowsingClient::new(
            SafeBrowsingVendor::Google,
            key,
        )?));
    }
    if let Ok(key) = std::env::var("YANDEX_SAFE_BROWSING_API_KEY") {
        vendors.push(Box::new(SafeBrowsingClient::new(
            SafeBrowsingVendor::Yandex,
            key,
        )?));
    }
    if vendors.is_empty() {
        return Err(CliError::Config(
            "no vendor API keys configured; set GOOGLE_SAFE_BROWSING_API_KEY and/or \
             YANDEX_SAFE_BROWSING_API_KEY"
                .to_string(),
        ));
    }
    Ok(vendors)
}

/// Write per-vendor and combined blocklist files, skipping empty sets.
fn write_blocklists(output_dir: &Path, blocklist: &Blocklist) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    for (vendor, flagged) in &blocklist.per_vendor {
        if flagged.is_empty() {
            continue;
        }
        let path = output_dir.join(format!("{}_domains.txt", vendor.to_lowercase()));
        std::fs::write(&path, render(flagged))?;
        info!(path = %path.display(), count = flagged.len(), "wrote vendor blocklist");
    }

    if !blocklist.combined.is_empty() {
        let path = output_dir.join("combined_domains.txt");
        std::fs::write(&path, render(&blocklist.combined))?;
        info!(path = %path.display(), count = blocklist.combined.len(), "wrote combined blocklist");
    }
    Ok(())
}

fn render(hosts: &[Hostname]) -> String {
    let mut out = hosts
        .iter()
        .map(Hostname::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}
