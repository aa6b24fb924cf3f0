//! Tranco ranking-list feed
//!
//! Fetches the research-oriented popularity ranking as plain CSV
//! (`rank,domain` per line). The ranking doubles as the run's whitelist:
//! [`TrancoSource::fetch_ranking`] returns it in rank order for candidate
//! selection, while the [`FeedSource`] implementation batches it into the
//! store like any other feed.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use dbh_common::Hostname;

use crate::error::{IngestError, Result};
use crate::source::{send_with_retry, BatchStream, FeedJob, FeedSource};

/// Configuration for the ranking-list feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrancoConfig {
    /// CSV download URL
    pub list_url: String,
    /// Store partition for the ranking
    pub target: String,
    /// Hostnames per emitted batch
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for TrancoConfig {
    fn default() -> Self {
        Self {
            list_url: "https://tranco-list.eu/top-1m.csv".to_string(),
            target: "tranco_top1m".to_string(),
            batch_size: 10_000,
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

/// Ranking-list feed source
pub struct TrancoSource {
    client: Client,
    config: TrancoConfig,
}

impl TrancoSource {
    pub fn new(config: TrancoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("dbh-ingest/0.1")
            .build()?;
        Ok(Self { client, config })
    }

    /// Download the full ranking, in rank order.
    ///
    /// Lines that do not parse as `rank,domain` are skipped. The ranking is
    /// bounded (about a million entries) so it is buffered rather than
    /// streamed.
    pub async fn fetch_ranking(&self) -> Result<Vec<Hostname>> {
        let response = send_with_retry(
            || self.client.get(&self.config.list_url),
            self.config.max_retries,
        )
        .await?;
        let body = response.text().await?;

        let ranking: Vec<Hostname> = body
            .lines()
            .filter_map(parse_ranked_line)
            .collect();
        if ranking.is_empty() {
            return Err(IngestError::Parse(
                "ranking list contained no parseable entries".to_string(),
            ));
        }

        info!(entries = ranking.len(), "fetched ranking list");
        Ok(ranking)
    }
}

/// Parse one `rank,domain` CSV line.
fn parse_ranked_line(line: &str) -> Option<Hostname> {
    let (_rank, domain) = line.split_once(',')?;
    Hostname::parse(domain)
}

#[async_trait]
impl FeedSource for TrancoSource {
    fn name(&self) -> &'static str {
        "tranco"
    }

    /// Single static job.
    async fn discover(&self) -> Result<Vec<FeedJob>> {
        Ok(vec![FeedJob::new(
            "tranco",
            self.config.target.clone(),
            self.config.list_url.clone(),
        )])
    }

    async fn run(&self, _job: &FeedJob) -> Result<BatchStream> {
        let ranking = self.fetch_ranking().await?;
        let batches: Vec<Result<Vec<Hostname>>> = ranking
            .chunks(self.config.batch_size.max(1))
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        Ok(Box::pin(futures::stream::iter(batches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranked_line() {
        assert_eq!(
            parse_ranked_line("1,google.com").unwrap().as_str(),
            "google.com"
        );
        assert_eq!(
            parse_ranked_line("999999,Sub.Example.ORG.").unwrap().as_str(),
            "sub.example.org"
        );
        assert!(parse_ranked_line("no-comma-here").is_none());
        assert!(parse_ranked_line("5,").is_none());
    }
}
