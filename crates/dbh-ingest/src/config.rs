//! Ingestion configuration
//!
//! One explicit configuration struct passed into components at
//! construction; no ambient globals. Credentials arrive here already
//! resolved — loading them from `.env` is the CLI's concern.

use serde::{Deserialize, Serialize};

use crate::sources::{DomainsProjectConfig, IcannConfig, TrancoConfig, WhoisExportConfig};

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// SQLite database URL, e.g. `sqlite://dbh.db`
    pub database_url: String,
    /// Feed sources active for this run, by name
    pub sources: Vec<String>,
    /// Bound on concurrently draining jobs
    pub max_concurrent_jobs: usize,
    /// Entries not seen for this many days are pruned after a run;
    /// `None` retains everything
    pub retention_days: Option<i64>,
    pub icann: IcannConfig,
    pub whois: WhoisExportConfig,
    pub domainsproject: DomainsProjectConfig,
    pub tranco: TrancoConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://dbh.db".to_string(),
            sources: vec!["tranco".to_string()],
            max_concurrent_jobs: 4,
            retention_days: None,
            icann: IcannConfig::default(),
            whois: WhoisExportConfig::default(),
            domainsproject: DomainsProjectConfig::default(),
            tranco: TrancoConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables.
    ///
    /// Recognized variables: `DBH_DATABASE_URL`, `DBH_SOURCES` (comma
    /// list), `DBH_MAX_CONCURRENT_JOBS`, `DBH_RETENTION_DAYS`,
    /// `ICANN_ACCOUNT_USERNAME`, `ICANN_ACCOUNT_PASSWORD`,
    /// `DBH_WHOIS_EXPORT_URL`, `DBH_DOMAINSPROJECT_ARCHIVES` (comma list),
    /// `DBH_TRANCO_LIST_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DBH_DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(sources) = std::env::var("DBH_SOURCES") {
            config.sources = split_list(&sources);
        }
        if let Ok(n) = std::env::var("DBH_MAX_CONCURRENT_JOBS") {
            if let Ok(n) = n.parse() {
                config.max_concurrent_jobs = n;
            }
        }
        if let Ok(days) = std::env::var("DBH_RETENTION_DAYS") {
            config.retention_days = days.parse().ok();
        }
        if let Ok(username) = std::env::var("ICANN_ACCOUNT_USERNAME") {
            config.icann.username = username;
        }
        if let Ok(password) = std::env::var("ICANN_ACCOUNT_PASSWORD") {
            config.icann.password = password;
        }
        if let Ok(url) = std::env::var("DBH_WHOIS_EXPORT_URL") {
            config.whois.export_url = url;
        }
        if let Ok(archives) = std::env::var("DBH_DOMAINSPROJECT_ARCHIVES") {
            config.domainsproject.archives = split_list(&archives);
        }
        if let Ok(url) = std::env::var("DBH_TRANCO_LIST_URL") {
            config.tranco.list_url = url;
        }

        config
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
