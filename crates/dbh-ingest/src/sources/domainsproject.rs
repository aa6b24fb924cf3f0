//! Domains Project static-archive feed
//!
//! One job per configured archive file; each archive is a gzip-compressed
//! plain list of domains served from a static base URL.

use async_trait::async_trait;
use reqwest::header::ACCEPT_ENCODING;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::error::Result;
use crate::source::{
    gzip_batch_stream, sanitize_target, send_with_retry, BatchStream, FeedJob, FeedSource,
};

/// Configuration for the Domains Project feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsProjectConfig {
    /// Base URL the archive filenames are appended to
    pub base_url: String,
    /// Archive filenames to download, e.g. `["domains-part-00.txt.gz"]`
    pub archives: Vec<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for DomainsProjectConfig {
    fn default() -> Self {
        Self {
            base_url: "https://raw.githubusercontent.com/tb0hdan/domains/master/data".to_string(),
            archives: Vec::new(),
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

/// Static-file-download feed source
pub struct DomainsProjectSource {
    client: Client,
    config: DomainsProjectConfig,
}

impl DomainsProjectSource {
    pub fn new(config: DomainsProjectConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("dbh-ingest/0.1")
            .build()?;
        Ok(Self { client, config })
    }

    /// Partition name for one archive: `domains-part-00.txt.gz` ->
    /// `domainsproject_domains_part_00`.
    fn target_for(archive: &str) -> String {
        let stem = archive
            .strip_suffix(".txt.gz")
            .or_else(|| archive.strip_suffix(".gz"))
            .unwrap_or(archive);
        format!("domainsproject_{}", sanitize_target(stem))
    }
}

#[async_trait]
impl FeedSource for DomainsProjectSource {
    fn name(&self) -> &'static str {
        "domainsproject"
    }

    /// One job per configured archive; an empty archive list just means
    /// zero jobs.
    async fn discover(&self) -> Result<Vec<FeedJob>> {
        if self.config.archives.is_empty() {
            info!("no archives configured");
        }
        Ok(self
            .config
            .archives
            .iter()
            .map(|archive| {
                let endpoint = format!(
                    "{}/{}",
                    self.config.base_url.trim_end_matches('/'),
                    archive
                );
                FeedJob::new("domainsproject", Self::target_for(archive), endpoint)
            })
            .collect())
    }

    async fn run(&self, job: &FeedJob) -> Result<BatchStream> {
        let response = send_with_retry(
            || {
                self.client
                    .get(&job.endpoint)
                    .header(ACCEPT_ENCODING, "gzip")
            },
            self.config.max_retries,
        )
        .await?;
        Ok(gzip_batch_stream(response))
    }
}
