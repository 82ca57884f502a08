//! Token acquisition and refresh
//!
//! A long-lived OAuth secret is exchanged for a short-lived IAM token that
//! every speech request carries as a bearer credential. The exchanged token
//! is cached and reused until its validity window lapses; concurrent
//! callers share a single in-flight refresh.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::SpeechKitConfig;
use crate::error::SpeechKitError;
use crate::http;

/// Default validity window for an obtained IAM token: 11.9 hours, safely
/// inside the service-side 12 hour expiry
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(42_840);

/// A bearer token together with the instant it was obtained
#[derive(Debug, Clone)]
pub struct Credential {
    token: String,
    obtained_at: Instant,
}

impl Credential {
    /// Create a credential obtained now
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: Instant::now(),
        }
    }

    /// The bearer token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Time elapsed since this credential was obtained
    #[must_use]
    pub fn age(&self) -> Duration {
        self.obtained_at.elapsed()
    }

    /// Whether this credential has outlived the given validity window
    #[must_use]
    pub fn is_expired(&self, validity: Duration) -> bool {
        self.age() >= validity
    }
}

/// Port for bearer-token acquisition
///
/// # Example
///
/// ```ignore
/// use speechkit::{Authorizer, SpeechKitError};
///
/// async fn bearer_header(authorizer: &impl Authorizer) -> Result<String, SpeechKitError> {
///     let token = authorizer.auth_token().await?;
///     Ok(format!("Bearer {token}"))
/// }
/// ```
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Produce a token suitable for authenticating a request right now,
    /// refreshing first when the stored credential is absent or expired
    ///
    /// # Returns
    ///
    /// Returns the bearer token string.
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::Auth` when acquisition fails or yields no
    /// usable token.
    async fn auth_token(&self) -> Result<String, SpeechKitError>;

    /// Whether the next `auth_token` call would have to refresh
    async fn needs_refresh(&self) -> bool;
}

/// Exchange request payload
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    #[serde(rename = "yandexPassportOauthToken")]
    oauth_token: &'a str,
}

/// Exchange response payload
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "iamToken", default)]
    iam_token: String,
}

/// Authorizer exchanging a long-lived OAuth token for IAM tokens
#[derive(Debug)]
pub struct IamAuthorizer {
    client: reqwest::Client,
    oauth_token: String,
    token_url: String,
    validity: Duration,
    credential: Mutex<Option<Credential>>,
}

impl IamAuthorizer {
    /// Create an authorizer for the configured OAuth token and exchange
    /// endpoint
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` when the config carries no
    /// OAuth token or the HTTP client cannot be built.
    pub fn new(config: &SpeechKitConfig) -> Result<Self, SpeechKitError> {
        let oauth_token = config
            .oauth_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                SpeechKitError::InvalidArgument(
                    "OAuth token is required for IAM authorization".to_string(),
                )
            })?;

        Ok(Self {
            client: http::build_client(config)?,
            oauth_token,
            token_url: format!("{}/iam/v1/tokens", config.iam_base_url),
            validity: Duration::from_secs(config.token_validity_secs),
            credential: Mutex::new(None),
        })
    }

    /// Override the validity window
    #[must_use]
    pub const fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Perform one OAuth → IAM exchange
    ///
    /// The acquisition instant is taken before the exchange starts, so the
    /// window errs on the side of refreshing early.
    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<Credential, SpeechKitError> {
        info!("refreshing IAM token");
        let started = Instant::now();

        let request = self.client.post(&self.token_url).json(&TokenRequest {
            oauth_token: &self.oauth_token,
        });
        let body = http::execute_text(request)
            .await
            .map_err(|e| SpeechKitError::Auth(format!("token exchange failed: {e}")))?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            SpeechKitError::Auth(format!("token exchange returned malformed JSON: {e}"))
        })?;

        if parsed.iam_token.is_empty() {
            return Err(SpeechKitError::Auth(
                "token exchange returned an empty token".to_string(),
            ));
        }

        debug!(elapsed = ?started.elapsed(), "IAM token refreshed");
        Ok(Credential {
            token: parsed.iam_token,
            obtained_at: started,
        })
    }
}

#[async_trait]
impl Authorizer for IamAuthorizer {
    async fn auth_token(&self) -> Result<String, SpeechKitError> {
        // Holding the lock across the exchange is what serializes
        // concurrent refreshes: followers block here and then find a fresh
        // credential already stored.
        let mut slot = self.credential.lock().await;
        if let Some(credential) = slot.as_ref() {
            if !credential.is_expired(self.validity) {
                return Ok(credential.token().to_string());
            }
        }

        let credential = self.refresh().await?;
        let token = credential.token().to_string();
        *slot = Some(credential);
        Ok(token)
    }

    async fn needs_refresh(&self) -> bool {
        let slot = self.credential.lock().await;
        slot.as_ref()
            .is_none_or(|credential| credential.is_expired(self.validity))
    }
}

/// Authorizer handing out a fixed token, never refreshing
///
/// For tests and for callers that manage the token lifecycle externally.
#[derive(Debug, Clone)]
pub struct StaticAuthorizer {
    token: String,
}

impl StaticAuthorizer {
    /// Wrap an externally managed token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn auth_token(&self) -> Result<String, SpeechKitError> {
        Ok(self.token.clone())
    }

    async fn needs_refresh(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: &str) -> SpeechKitConfig {
        SpeechKitConfig {
            iam_base_url: base_url.to_string(),
            ..SpeechKitConfig::test()
        }
    }

    fn token_exchange() -> MockBuilder {
        Mock::given(method("POST"))
            .and(path("/iam/v1/tokens"))
            .and(body_json(serde_json::json!({
                "yandexPassportOauthToken": "test-oauth"
            })))
    }

    #[tokio::test]
    async fn needs_refresh_before_first_acquisition() {
        let authorizer = IamAuthorizer::new(&test_config("http://localhost:9")).unwrap();
        assert!(authorizer.needs_refresh().await);
    }

    #[tokio::test]
    async fn auth_token_exchanges_oauth_for_iam_token() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "iam-123"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        let token = authorizer.auth_token().await.unwrap();

        assert_eq!(token, "iam-123");
        assert!(!authorizer.needs_refresh().await);
    }

    #[tokio::test]
    async fn repeated_calls_reuse_the_cached_token() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "iam-123"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        let first = authorizer.auth_token().await.unwrap();
        let second = authorizer.auth_token().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn token_is_reused_inside_the_validity_window() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "iam-123"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri()))
            .unwrap()
            .with_validity(Duration::from_secs(60));

        let first = authorizer.auth_token().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!authorizer.needs_refresh().await);

        let second = authorizer.auth_token().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn token_refreshes_once_the_validity_window_lapses() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "token-one"})),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "token-two"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri()))
            .unwrap()
            .with_validity(Duration::from_millis(50));

        let first = authorizer.auth_token().await.unwrap();
        assert_eq!(first, "token-one");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(authorizer.needs_refresh().await);

        let second = authorizer.auth_token().await.unwrap();
        assert_eq!(second, "token-two");
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_single_refresh() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"iamToken": "shared-token"}))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let authorizer = Arc::new(IamAuthorizer::new(&test_config(&server.uri())).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let authorizer = Arc::clone(&authorizer);
                tokio::spawn(async move { authorizer.auth_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared-token");
        }
    }

    #[tokio::test]
    async fn empty_token_in_response_is_an_auth_error() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"iamToken": ""})),
            )
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        let err = authorizer.auth_token().await.unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("empty token"));
    }

    #[tokio::test]
    async fn missing_token_field_is_an_auth_error() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        assert!(authorizer.auth_token().await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn malformed_exchange_response_is_an_auth_error() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        let err = authorizer.auth_token().await.unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn exchange_failure_status_is_an_auth_error() {
        let server = MockServer::start().await;
        token_exchange()
            .respond_with(ResponseTemplate::new(401).set_body_string("bad oauth token"))
            .mount(&server)
            .await;

        let authorizer = IamAuthorizer::new(&test_config(&server.uri())).unwrap();
        let err = authorizer.auth_token().await.unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn new_requires_an_oauth_token() {
        let mut config = SpeechKitConfig::test();
        config.oauth_token = None;

        let err = IamAuthorizer::new(&config).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn static_authorizer_hands_out_its_token_and_never_refreshes() {
        let authorizer = StaticAuthorizer::new("fixed-token");

        assert_eq!(authorizer.auth_token().await.unwrap(), "fixed-token");
        assert!(!authorizer.needs_refresh().await);
    }

    mod credential {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn expires_exactly_at_the_window_boundary() {
            let credential = Credential::new("tok");
            let window = Duration::from_secs(10);

            assert!(!credential.is_expired(window));

            tokio::time::advance(Duration::from_secs(9)).await;
            assert!(!credential.is_expired(window));

            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(credential.is_expired(window));
        }

        #[tokio::test(start_paused = true)]
        async fn age_tracks_elapsed_time() {
            let credential = Credential::new("tok");
            tokio::time::advance(Duration::from_secs(42)).await;
            assert_eq!(credential.age(), Duration::from_secs(42));
        }
    }
}
