//! End-to-end tests for the Safe Browsing vendor clients
//!
//! Validates the `threatMatches:find` request shape, response parsing, and
//! error surfacing against a mocked deployment.

use std::collections::HashSet;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dbh_common::Hostname;
use dbh_lookup::{LookupError, SafeBrowsingClient, SafeBrowsingVendor, VendorClient};

fn hosts(names: &[&str]) -> Vec<Hostname> {
    names.iter().map(|n| Hostname::parse(n).unwrap()).collect()
}

fn client_for(server: &MockServer) -> SafeBrowsingClient {
    SafeBrowsingClient::new(SafeBrowsingVendor::Google, "test-key")
        .unwrap()
        .with_endpoint(format!("{}/v4/threatMatches:find", server.uri()))
}

#[tokio::test]
async fn test_check_batch_parses_flagged_subset() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/threatMatches:find"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "client": { "clientId": "dbh" },
            "threatInfo": {
                "threatEntryTypes": ["URL"],
                "threatEntries": [
                    { "url": "http://safe.example/" },
                    { "url": "http://evil.example/" }
                ]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [{
                "threatType": "MALWARE",
                "platformType": "ANY_PLATFORM",
                "threatEntryType": "URL",
                "threat": { "url": "http://evil.example/" },
                "cacheDuration": "300s"
            }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let batch = hosts(&["safe.example", "evil.example"]);
    let flagged = client.check_batch(&batch).await.unwrap();

    let names: HashSet<&str> = flagged.iter().map(|h| h.as_str()).collect();
    assert_eq!(names, HashSet::from(["evil.example"]));
}

#[tokio::test]
async fn test_no_matches_means_empty_flagged_set() {
    let server = MockServer::start().await;

    // A batch with no flagged entries answers with an empty body
    Mock::given(method("POST"))
        .and(path("/v4/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let flagged = client
        .check_batch(&hosts(&["clean.example"]))
        .await
        .unwrap();
    assert!(flagged.is_empty());
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/threatMatches:find"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.check_batch(&hosts(&["any.example"])).await;
    assert!(matches!(result, Err(LookupError::Status(_))));
}

#[tokio::test]
async fn test_unsubmitted_hostnames_in_response_are_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [
                { "threat": { "url": "http://submitted.example/" } },
                { "threat": { "url": "http://never-asked.example/" } }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let flagged = client
        .check_batch(&hosts(&["submitted.example"]))
        .await
        .unwrap();

    let names: HashSet<&str> = flagged.iter().map(|h| h.as_str()).collect();
    assert_eq!(names, HashSet::from(["submitted.example"]));
}
