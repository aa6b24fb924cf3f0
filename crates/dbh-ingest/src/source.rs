//! Feed source interface
//!
//! Every external origin of candidate domains implements [`FeedSource`]:
//! `discover` enumerates the concrete units of work the current credentials
//! give access to, and `run` streams one job's hostnames in batches. The
//! scheduler depends only on this interface; variants differ solely in how
//! they obtain bytes.

use async_trait::async_trait;
use futures::stream::StreamExt;
use std::pin::Pin;
use std::time::Duration;
use tracing::warn;

use dbh_common::Hostname;

use crate::auth::AuthCredential;
use crate::decoder::GzipLineDecoder;
use crate::error::{IngestError, Result};

/// The atomic unit of persistence: a within-batch-deduplicated set of
/// hostnames produced by one decode step. A batch is committed fully or not
/// at all.
pub type HostnameBatch = Vec<Hostname>;

/// A pull-based sequence of batches. Restartable only by re-invoking
/// [`FeedSource::run`]; never seekable.
pub type BatchStream = Pin<Box<dyn futures::Stream<Item = Result<HostnameBatch>> + Send>>;

/// One concrete unit of ingestion work against a feed.
#[derive(Debug, Clone)]
pub struct FeedJob {
    /// Origin identifier, e.g. "icann"
    pub origin: String,
    /// Store partition (table) this job writes to, e.g. "icann_com"
    pub target: String,
    /// Endpoint URL the job downloads from
    pub endpoint: String,
    /// Bearer credential captured at discovery time, for token-gated feeds
    pub credential: Option<AuthCredential>,
}

impl FeedJob {
    pub fn new(origin: impl Into<String>, target: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            endpoint: endpoint.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: AuthCredential) -> Self {
        self.credential = Some(credential);
        self
    }
}

/// A named external origin of candidate domain names.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Enumerate the jobs this source currently offers.
    ///
    /// May take up to two network round-trips (authenticate, then list).
    /// Zero accessible jobs is not an error; implementations log and return
    /// an empty list.
    async fn discover(&self) -> Result<Vec<FeedJob>>;

    /// Stream one job's hostnames in batches.
    async fn run(&self, job: &FeedJob) -> Result<BatchStream>;
}

/// Derive a safe partition name component from free-form feed metadata.
pub(crate) fn sanitize_target(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Issue a request with bounded retries and exponential backoff.
///
/// `build` constructs a fresh request for each attempt. Non-2xx statuses
/// count as failures. Authentication exchanges do not go through here; a
/// feed whose credentials are rejected fails fast instead.
pub(crate) async fn send_with_retry<F>(build: F, max_retries: u32) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let attempts = max_retries.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                warn!(
                    attempt,
                    attempts,
                    status = %response.status(),
                    "request returned error status"
                );
                last_error = Some(IngestError::Status(response.status()));
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, "request failed");
                last_error = Some(IngestError::Request(e));
            }
        }

        if attempt < attempts {
            let backoff_secs = 2u64.pow(attempt);
            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Err(IngestError::Parse(
            "retry loop exhausted without capturing an error".to_string(),
        )),
    }
}

enum GzipStreamState<B> {
    Streaming { body: B, decoder: GzipLineDecoder },
    Done,
}

/// Adapt a gzip-compressed HTTP body into a stream of hostname batches.
///
/// Each transport chunk becomes at most one batch; empty batches are not
/// yielded. A decode failure or transport error ends the stream after
/// surfacing the error — batches already yielded remain valid.
pub(crate) fn gzip_batch_stream(response: reqwest::Response) -> BatchStream {
    let body = Box::pin(response.bytes_stream());
    let stream = futures::stream::unfold(
        GzipStreamState::Streaming {
            body,
            decoder: GzipLineDecoder::new(),
        },
        |state| async move {
            match state {
                GzipStreamState::Done => None,
                GzipStreamState::Streaming {
                    mut body,
                    mut decoder,
                } => loop {
                    match body.next().await {
                        Some(Ok(chunk)) => match decoder.feed(&chunk) {
                            Ok(batch) if batch.is_empty() => continue,
                            Ok(batch) => {
                                return Some((
                                    Ok(batch),
                                    GzipStreamState::Streaming { body, decoder },
                                ))
                            }
                            Err(e) => return Some((Err(e), GzipStreamState::Done)),
                        },
                        Some(Err(e)) => {
                            return Some((Err(IngestError::Request(e)), GzipStreamState::Done))
                        }
                        None => {
                            return match decoder.finish() {
                                Ok(batch) if batch.is_empty() => None,
                                Ok(batch) => Some((Ok(batch), GzipStreamState::Done)),
                                Err(e) => Some((Err(e), GzipStreamState::Done)),
                            }
                        }
                    }
                },
            }
        },
    );
    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_target() {
        assert_eq!(sanitize_target("COM"), "com");
        assert_eq!(sanitize_target("xn--p1ai"), "xn__p1ai");
        assert_eq!(sanitize_target("a.b/c"), "a_b_c");
    }

    #[test]
    fn test_feed_job_builder() {
        let job = FeedJob::new("icann", "icann_com", "https://example.test/com.zone");
        assert_eq!(job.origin, "icann");
        assert_eq!(job.target, "icann_com");
        assert!(job.credential.is_none());
    }
}
