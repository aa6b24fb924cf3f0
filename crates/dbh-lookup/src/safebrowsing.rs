//! Safe Browsing vendor clients
//!
//! Google and Yandex expose the same `threatMatches:find` JSON protocol;
//! the two clients differ only in endpoint and API key. Requests carry up
//! to [`MAX_BATCH_SIZE`] URL entries; the response lists matches for the
//! flagged ones.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use dbh_common::Hostname;

use crate::error::{LookupError, Result};
use crate::vendor::VendorClient;

/// Documented ceiling on threat entries per request
pub const MAX_BATCH_SIZE: usize = 500;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which Safe Browsing deployment a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeBrowsingVendor {
    Google,
    Yandex,
}

impl SafeBrowsingVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeBrowsingVendor::Google => "Google",
            SafeBrowsingVendor::Yandex => "Yandex",
        }
    }

    fn default_endpoint(&self) -> &'static str {
        match self {
            SafeBrowsingVendor::Google => {
                "https://safebrowsing.googleapis.com/v4/threatMatches:find"
            }
            SafeBrowsingVendor::Yandex => "https://sba.yandex.net/v4/threatMatches:find",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Serialize)]
struct ThreatEntry {
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: &'a [&'a str],
    platform_types: &'a [&'a str],
    threat_entry_types: &'a [&'a str],
    threat_entries: Vec<ThreatEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FindThreatMatchesRequest<'a> {
    client: ClientInfo<'a>,
    threat_info: ThreatInfo<'a>,
}

#[derive(Deserialize)]
struct ThreatMatchEntry {
    url: String,
}

#[derive(Deserialize)]
struct ThreatMatch {
    threat: ThreatMatchEntry,
}

#[derive(Deserialize, Default)]
struct FindThreatMatchesResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];
const PLATFORM_TYPES: &[&str] = &["ANY_PLATFORM"];
const THREAT_ENTRY_TYPES: &[&str] = &["URL"];

/// Client for one Safe Browsing deployment
pub struct SafeBrowsingClient {
    client: Client,
    vendor: SafeBrowsingVendor,
    endpoint: String,
    api_key: String,
}

impl SafeBrowsingClient {
    pub fn new(vendor: SafeBrowsingVendor, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LookupError::MissingApiKey(vendor.as_str().to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent("dbh-lookup/0.1")
            .build()?;
        Ok(Self {
            client,
            vendor,
            endpoint: vendor.default_endpoint().to_string(),
            api_key,
        })
    }

    /// Point the client at a non-default endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Recover the hostname from a threat-match URL.
fn host_from_threat_url(url: &str) -> Option<Hostname> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.split(':').next().unwrap_or(host);
    Hostname::parse(host)
}

#[async_trait]
impl VendorClient for SafeBrowsingClient {
    fn name(&self) -> &str {
        self.vendor.as_str()
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    async fn check_batch(&self, batch: &[Hostname]) -> Result<HashSet<Hostname>> {
        let request = FindThreatMatchesRequest {
            client: ClientInfo {
                client_id: "dbh",
                client_version: env!("CARGO_PKG_VERSION"),
            },
            threat_info: ThreatInfo {
                threat_types: THREAT_TYPES,
                platform_types: PLATFORM_TYPES,
                threat_entry_types: THREAT_ENTRY_TYPES,
                threat_entries: batch
                    .iter()
                    .map(|host| ThreatEntry {
                        url: format!("http://{host}/"),
                    })
                    .collect(),
            },
        };

        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let body: FindThreatMatchesResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(format!("malformed threat-match response: {e}")))?;

        // Only hostnames from the submitted batch may come back flagged
        let submitted: HashSet<&Hostname> = batch.iter().collect();
        let flagged: HashSet<Hostname> = body
            .matches
            .iter()
            .filter_map(|m| host_from_threat_url(&m.threat.url))
            .filter(|host| submitted.contains(host))
            .collect();

        debug!(
            vendor = self.vendor.as_str(),
            submitted = batch.len(),
            flagged = flagged.len(),
            "batch lookup complete"
        );
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_threat_url() {
        assert_eq!(
            host_from_threat_url("http://evil.example/").unwrap().as_str(),
            "evil.example"
        );
        assert_eq!(
            host_from_threat_url("https://evil.example:8443/login?x=1")
                .unwrap()
                .as_str(),
            "evil.example"
        );
        assert_eq!(
            host_from_threat_url("evil.example").unwrap().as_str(),
            "evil.example"
        );
        assert!(host_from_threat_url("http:///").is_none());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = SafeBrowsingClient::new(SafeBrowsingVendor::Google, "");
        assert!(matches!(result, Err(LookupError::MissingApiKey(_))));
    }

    #[test]
    fn test_vendor_names_and_endpoints() {
        assert_eq!(SafeBrowsingVendor::Google.as_str(), "Google");
        assert_eq!(SafeBrowsingVendor::Yandex.as_str(), "Yandex");
        assert!(SafeBrowsingVendor::Yandex
            .default_endpoint()
            .contains("yandex"));
    }
}
