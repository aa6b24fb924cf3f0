//! Bearer-token authentication for token-gated feeds
//!
//! The zone-file API hands out an access token that expires 24 hours after
//! issuance. A [`TokenAuthSession`] performs the credential exchange and
//! holds the resulting [`AuthCredential`]; callers ask the session for a
//! token at request time so that a stale credential is re-acquired instead
//! of reused.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Access tokens are valid for 24 hours from issuance
pub fn token_validity() -> Duration {
    Duration::hours(24)
}

/// A bearer token together with its issuance time.
///
/// Credentials are created per run and discarded at run end; they are never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    token: String,
    issued_at: DateTime<Utc>,
}

impl AuthCredential {
    pub fn new(token: String, issued_at: DateTime<Utc>) -> Self {
        Self { token, issued_at }
    }

    /// Whether the credential may be used for a request issued at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.issued_at && now - self.issued_at < token_validity()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: Option<String>,
}

/// Performs the token exchange and holds the current credential.
pub struct TokenAuthSession {
    client: Client,
    auth_url: String,
    username: String,
    password: String,
    current: Option<AuthCredential>,
}

impl TokenAuthSession {
    pub fn new(client: Client, auth_url: String, username: String, password: String) -> Self {
        Self {
            client,
            auth_url,
            username,
            password,
            current: None,
        }
    }

    /// Return a credential valid at `Utc::now()`, re-authenticating when the
    /// held one has expired or none exists yet.
    pub async fn credential(&mut self) -> Result<AuthCredential> {
        let now = Utc::now();
        if let Some(cred) = &self.current {
            if cred.is_valid_at(now) {
                return Ok(cred.clone());
            }
            debug!("held access token has expired, re-authenticating");
        }
        self.authenticate().await
    }

    /// Perform one authentication exchange.
    ///
    /// A response without a token field is an [`IngestError::Auth`] — a
    /// blank token must never be substituted for real requests. No retry is
    /// attempted here; retry policy belongs to the caller.
    pub async fn authenticate(&mut self) -> Result<AuthCredential> {
        let issued_at = Utc::now();
        let response = self
            .client
            .post(&self.auth_url)
            .json(&AuthRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::Auth(format!(
                "authentication endpoint returned {}",
                response.status()
            )));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Auth(format!("malformed authentication response: {e}")))?;

        let token = match body.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(IngestError::Auth(
                    "authentication response carried no access token".to_string(),
                ))
            }
        };

        info!("acquired access token valid for 24h");
        let credential = AuthCredential::new(token, issued_at);
        self.current = Some(credential.clone());
        Ok(credential)
    }

    /// Seed the session with an existing credential (tests and job replay).
    pub fn set_credential(&mut self, credential: AuthCredential) {
        self.current = Some(credential);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_valid_within_window() {
        let issued = Utc::now();
        let cred = AuthCredential::new("tok".to_string(), issued);
        assert!(cred.is_valid_at(issued));
        assert!(cred.is_valid_at(issued + Duration::hours(23)));
    }

    #[test]
    fn test_credential_rejected_past_window() {
        let issued = Utc::now();
        let cred = AuthCredential::new("tok".to_string(), issued);
        assert!(!cred.is_valid_at(issued + Duration::hours(24)));
        assert!(!cred.is_valid_at(issued + Duration::hours(25)));
    }

    #[test]
    fn test_credential_rejected_before_issuance() {
        let issued = Utc::now();
        let cred = AuthCredential::new("tok".to_string(), issued);
        assert!(!cred.is_valid_at(issued - Duration::minutes(1)));
    }

    #[test]
    fn test_bearer_header_value() {
        let cred = AuthCredential::new("abc123".to_string(), Utc::now());
        assert_eq!(cred.bearer(), "Bearer abc123");
    }

    #[tokio::test]
    async fn test_session_reuses_valid_credential() {
        // Session with an unreachable auth URL: credential() must not hit
        // the network while the held token is still valid.
        let mut session = TokenAuthSession::new(
            Client::new(),
            "http://127.0.0.1:1/authenticate".to_string(),
            "user".to_string(),
            "pass".to_string(),
        );
        session.set_credential(AuthCredential::new("fresh".to_string(), Utc::now()));

        let cred = session.credential().await.unwrap();
        assert_eq!(cred.token(), "fresh");
    }

    #[tokio::test]
    async fn test_session_refuses_stale_credential() {
        // A token issued 25 hours ago must not be reused; with the auth
        // endpoint unreachable, re-authentication fails loudly instead.
        let mut session = TokenAuthSession::new(
            Client::new(),
            "http://127.0.0.1:1/authenticate".to_string(),
            "user".to_string(),
            "pass".to_string(),
        );
        session.set_credential(AuthCredential::new(
            "stale".to_string(),
            Utc::now() - Duration::hours(25),
        ));

        assert!(session.credential().await.is_err());
    }
}
