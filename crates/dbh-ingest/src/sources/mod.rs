//! Concrete feed source implementations
//!
//! Variants differ only in how they obtain bytes and how many jobs they
//! discover:
//!
//! - **icann**: token-gated zone-file API, one job per approved endpoint
//! - **whois**: WHOIS-style registrar bulk export, single static job
//! - **domainsproject**: static archive downloads, one job per file
//! - **tranco**: ranking-list HTTP fetch, single job (also the whitelist)

pub mod domainsproject;
pub mod icann;
pub mod tranco;
pub mod whois;

pub use domainsproject::{DomainsProjectConfig, DomainsProjectSource};
pub use icann::{IcannConfig, IcannSource};
pub use tranco::{TrancoConfig, TrancoSource};
pub use whois::{WhoisExportConfig, WhoisExportSource};

use tracing::info;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::source::FeedSource;

/// Assemble the active feed sources named in the configuration.
///
/// The scheduler only ever sees the closed [`FeedSource`] interface; this
/// is the single place concrete source types are constructed.
pub fn registry(config: &IngestConfig) -> Result<Vec<Box<dyn FeedSource>>> {
    let mut sources: Vec<Box<dyn FeedSource>> = Vec::new();

    for name in &config.sources {
        match name.as_str() {
            "icann" => sources.push(Box::new(IcannSource::new(config.icann.clone())?)),
            "whois" => sources.push(Box::new(WhoisExportSource::new(config.whois.clone())?)),
            "domainsproject" => sources.push(Box::new(DomainsProjectSource::new(
                config.domainsproject.clone(),
            )?)),
            "tranco" => sources.push(Box::new(TrancoSource::new(config.tranco.clone())?)),
            other => {
                return Err(crate::error::IngestError::Parse(format!(
                    "unknown feed source: {other}"
                )))
            }
        }
    }

    info!(count = sources.len(), "feed source registry assembled");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds_named_sources() {
        let config = IngestConfig {
            sources: vec!["whois".to_string(), "tranco".to_string()],
            ..Default::default()
        };
        let sources = registry(&config).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["whois", "tranco"]);
    }

    #[test]
    fn test_registry_rejects_unknown_source() {
        let config = IngestConfig {
            sources: vec!["carrier-pigeon".to_string()],
            ..Default::default()
        };
        assert!(registry(&config).is_err());
    }
}
