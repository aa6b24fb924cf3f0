//! Common types used across DBH

use serde::{Deserialize, Serialize};

/// A normalized domain name.
///
/// Hostnames are plain values compared by exact string equality after
/// normalization: the first whitespace-delimited token of the input,
/// lowercased, with a single trailing dot removed. No scheme, port or
/// path component is retained.
///
/// Construction goes through [`Hostname::parse`], which returns `None`
/// for inputs that normalize to the empty string (blank lines, lines
/// consisting of a lone dot, and so on).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Normalize one line of feed input into a hostname.
    ///
    /// The input may be a full zone-file record (`EXAMPLE.COM.\tNS\t...`),
    /// a bare domain, or anything in between; only the first
    /// whitespace-delimited token is considered.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.split_whitespace().next()?;
        let lowered = token.to_ascii_lowercase();
        let normalized = lowered.strip_suffix('.').unwrap_or(&lowered);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Hostname {
    fn borrow(&self) -> &str {
        &self.0
    }
}
