//! Registrar WHOIS bulk-export feed
//!
//! Single-job feed: one gzip-compressed export of recently registered
//! domains, published at a static URL. No authentication.

use async_trait::async_trait;
use reqwest::header::ACCEPT_ENCODING;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::source::{gzip_batch_stream, send_with_retry, BatchStream, FeedJob, FeedSource};

/// Configuration for the WHOIS bulk-export feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoisExportConfig {
    /// URL of the gzip-compressed export
    pub export_url: String,
    /// Store partition the export lands in
    pub target: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for WhoisExportConfig {
    fn default() -> Self {
        Self {
            export_url: "https://whois-exports.example.org/registered-domains.txt.gz".to_string(),
            target: "whois_export".to_string(),
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

/// WHOIS-style bulk-export feed source
pub struct WhoisExportSource {
    client: Client,
    config: WhoisExportConfig,
}

impl WhoisExportSource {
    pub fn new(config: WhoisExportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("dbh-ingest/0.1")
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl FeedSource for WhoisExportSource {
    fn name(&self) -> &'static str {
        "whois"
    }

    /// Static feed: exactly one job, no round-trips.
    async fn discover(&self) -> Result<Vec<FeedJob>> {
        Ok(vec![FeedJob::new(
            "whois",
            self.config.target.clone(),
            self.config.export_url.clone(),
        )])
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
