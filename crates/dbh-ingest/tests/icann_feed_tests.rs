//! End-to-end tests for the token-gated zone-file feed
//!
//! Exercises the full discover/run lifecycle against a mocked API:
//! authentication exchange, endpoint listing, and streaming gzip zone-file
//! decode.

use flate2::write::GzEncoder;
use flate2::Compression;
use futures::StreamExt;
use std::io::Write;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dbh_ingest::sources::{IcannConfig, IcannSource};
use dbh_ingest::{FeedSource, IngestError};

fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

fn test_config(server: &MockServer) -> IcannConfig {
    IcannConfig {
        auth_url: format!("{}/api/authenticate", server.uri()),
        links_url: format!("{}/czds/downloads/links", server.uri()),
        username: "zonefile-user".to_string(),
        password: "hunter2".to_string(),
        timeout_secs: 5,
        max_retries: 1,
    }
}

async fn mount_auth(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": token })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discover_lists_one_job_per_endpoint() {
    let server = MockServer::start().await;
    mount_auth(&server, "test-token").await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/links"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            format!("{}/czds/downloads/com.zone", server.uri()),
            format!("{}/czds/downloads/org.zone", server.uri()),
        ])))
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let jobs = source.discover().await.unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].origin, "icann");
    assert_eq!(jobs[0].target, "icann_com");
    assert_eq!(jobs[1].target, "icann_org");
    assert!(jobs[0].credential.is_some());
}

#[tokio::test]
async fn test_discover_without_token_fails_loudly() {
    let server = MockServer::start().await;

    // Authentication succeeds at the HTTP level but carries no token
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let result = source.discover().await;
    assert!(matches!(result, Err(IngestError::Auth(_))));
}

#[tokio::test]
async fn test_discover_tolerates_empty_listing() {
    let server = MockServer::start().await;
    mount_auth(&server, "test-token").await;

    // The API answers with an object instead of an endpoint array when the
    // account has no approved zones
    Mock::given(method("GET"))
        .and(path("/czds/downloads/links"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "none" })),
        )
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let jobs = source.discover().await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn test_run_streams_zone_file_batches() {
    let server = MockServer::start().await;
    mount_auth(&server, "test-token").await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([format!(
            "{}/czds/downloads/com.zone",
            server.uri()
        )])))
        .mount(&server)
        .await;

    let zone = "EXAMPLE.COM.\t172800\tIN\tNS\tns1.example.net.\n\
                Foo.Test.\t172800\tIN\tNS\tns2.example.net.\n\
                example.com.\t172800\tIN\tNS\tns2.example.net.\n";
    Mock::given(method("GET"))
        .and(path("/czds/downloads/com.zone"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(zone.as_bytes())))
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let jobs = source.discover().await.unwrap();
    let mut stream = source.run(&jobs[0]).await.unwrap();

    let mut hosts = std::collections::HashSet::new();
    while let Some(batch) = stream.next().await {
        hosts.extend(batch.unwrap());
    }

    let names: std::collections::HashSet<&str> = hosts.iter().map(|h| h.as_str()).collect();
    assert_eq!(
        names,
        std::collections::HashSet::from(["example.com", "foo.test"])
    );
}

#[tokio::test]
async fn test_run_surfaces_http_failure() {
    let server = MockServer::start().await;
    mount_auth(&server, "test-token").await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([format!(
            "{}/czds/downloads/com.zone",
            server.uri()
        )])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/com.zone"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let jobs = source.discover().await.unwrap();
    let result = source.run(&jobs[0]).await;
    assert!(matches!(result, Err(IngestError::Status(_))));
}

#[tokio::test]
async fn test_run_surfaces_corrupt_zone_stream() {
    let server = MockServer::start().await;
    mount_auth(&server, "test-token").await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([format!(
            "{}/czds/downloads/com.zone",
            server.uri()
        )])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/czds/downloads/com.zone"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not gzip".to_vec()))
        .mount(&server)
        .await;

    let source = IcannSource::new(test_config(&server)).unwrap();
    let jobs = source.discover().await.unwrap();
    let mut stream = source.run(&jobs[0]).await.unwrap();

    let first = stream.next().await.unwrap();
    assert!(matches!(first, Err(IngestError::StreamCorrupt(_))));
    // The stream ends after surfacing the corruption
    assert!(stream.next().await.is_none());
}
