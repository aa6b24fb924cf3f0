//! ICANN CZDS zone-file feed
//!
//! Token-gated feed: authenticate for a 24h access token, list the zone-file
//! endpoints the account has approved access to (one job each), then stream
//! each endpoint's gzip-compressed zone file through the line decoder.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::TokenAuthSession;
use crate::error::{IngestError, Result};
use crate::source::{
    gzip_batch_stream, sanitize_target, send_with_retry, BatchStream, FeedJob, FeedSource,
};

/// Configuration for the ICANN CZDS feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcannConfig {
    /// Authentication endpoint (POST, JSON credentials)
    pub auth_url: String,
    /// Endpoint listing the zone files this account may download
    pub links_url: String,
    /// Account username (already resolved; never loaded here)
    pub username: String,
    /// Account password (already resolved; never loaded here)
    pub password: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Bounded retries for transient request failures
    pub max_retries: u32,
}

impl Default for IcannConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://account-api.icann.org/api/authenticate".to_string(),
            links_url: "https://czds-api.icann.org/czds/downloads/links".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

/// Token-gated zone-file feed source
pub struct IcannSource {
    client: Client,
    session: Mutex<TokenAuthSession>,
    config: IcannConfig,
}

impl IcannSource {
    pub fn new(config: IcannConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("dbh-ingest/0.1")
            .build()?;
        let session = Mutex::new(TokenAuthSession::new(
            client.clone(),
            config.auth_url.clone(),
            config.username.clone(),
            config.password.clone(),
        ));
        Ok(Self {
            client,
            session,
            config,
        })
    }

    /// Partition name for one zone endpoint: `.../com.zone` -> `icann_com`.
    fn target_for(endpoint: &str) -> String {
        let filename = endpoint.rsplit('/').next().unwrap_or(endpoint);
        let tld = filename.split('.').next().unwrap_or(filename);
        format!("icann_{}", sanitize_target(tld))
    }
}

#[async_trait]
impl FeedSource for IcannSource {
    fn name(&self) -> &'static str {
        "icann"
    }

    /// Two round-trips: authenticate, then list approved endpoints.
    async fn discover(&self) -> Result<Vec<FeedJob>> {
        let credential = self.session.lock().await.authenticate().await?;

        let response = send_with_retry(
            || {
                self.client
                    .get(&self.config.links_url)
                    .header(CONTENT_TYPE, "application/json")
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, credential.bearer())
            },
            self.config.max_retries,
        )
        .await?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IngestError::Parse(format!("malformed endpoint listing: {e}")))?;

        let Some(entries) = body.as_array() else {
            warn!("no user-accessible zone files found");
            return Ok(Vec::new());
        };

        let endpoints: Vec<String> = entries
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if endpoints.is_empty() {
            warn!("zone file listing was empty");
            return Ok(Vec::new());
        }

        info!(count = endpoints.len(), "discovered approved zone endpoints");
        Ok(endpoints
            .into_iter()
            .map(|endpoint| {
                let target = Self::target_for(&endpoint);
                FeedJob::new("icann", target, endpoint).with_credential(credential.clone())
            })
            .collect())
    }

    async fn run(&self, job: &FeedJob) -> Result<BatchStream> {
        // Never reuse a credential outside its validity window; a stale one
        // is replaced by a fresh authentication exchange.
        let bearer = match &job.credential {
            Some(cred) if cred.is_valid_at(Utc::now()) => cred.bearer(),
            _ => {
                debug!(target = %job.target, "job credential stale, re-authenticating");
                self.session.lock().await.credential().await?.bearer()
            }
        };

        let response = send_with_retry(
            || {
                self.client
                    .get(&job.endpoint)
                    .header(ACCEPT_ENCODING, "gzip")
                    .header(AUTHORIZATION, &bearer)
            },
            self.config.max_retries,
        )
        .await?;

        Ok(gzip_batch_stream(response))
    }
}
