//! `dbh update` - harvest all configured feeds into the local store

use tracing::info;

use dbh_ingest::{registry, FeedStore, IngestConfig, IngestionScheduler};

use crate::error::Result;

pub async fn run(sources_override: Option<Vec<String>>) -> Result<()> {
    let mut config = IngestConfig::from_env();
    if let Some(sources) = sources_override {
        config.sources = sources;
    }

    info!(sources = ?config.sources, "starting ingestion run");
    let sources = registry(&config)?;
    let store = FeedStore::connect(&config.database_url).await?;
    let scheduler = IngestionScheduler::new(
        store,
        config.max_concurrent_jobs,
        config.retention_days,
    );

    let summary = scheduler.run(&sources).await;
    println!("{}", summary.report());
    Ok(())
}
