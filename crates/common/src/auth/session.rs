//! Session manager with transparent token renewal
//!
//! Manages the OIDC session lifecycle:
//! - Discovery document retrieval (once per `initialize()`)
//! - Refresh-token exchange at the discovered token endpoint
//! - Expiry watermark at half of the advertised token lifetime
//! - Guard that renews a stale token before handing it out

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{DiscoveryDocument, MerchantCredentials, TokenRecord, TokenResponse};
use crate::http::{HttpTransport, TransportError, TransportRequest};
use crate::time::{Clock, SystemClock};

/// Why a discovery fetch or token exchange did not produce a usable value
#[derive(Debug, Error)]
pub enum ExchangeFailure {
    /// No response was received
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-2xx status
    #[error("endpoint responded with HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as text
        body: String,
    },

    /// The body was not JSON or lacked required fields
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Error type for session manager operations
///
/// Renewal failures are deliberately collapsed into a single
/// [`TokenRenewalFailed`](SessionError::TokenRenewalFailed) kind; the
/// underlying [`ExchangeFailure`] is only reachable through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// A guarded call ran before `initialize()` succeeded
    #[error("session not initialized; call initialize() first")]
    NotInitialized,

    /// The discovery document could not be fetched or parsed
    #[error("failed to load discovery document from {endpoint}")]
    Discovery {
        /// Discovery endpoint that was queried
        endpoint: String,
        /// Underlying failure
        #[source]
        source: ExchangeFailure,
    },

    /// The refresh-token exchange failed
    #[error("failed to renew access token")]
    TokenRenewalFailed {
        /// Underlying failure, for diagnostics only
        #[source]
        source: ExchangeFailure,
    },
}

/// Owner of the discovery document, the cached token and the initialized
/// flag
///
/// All three are replaced by whole-value substitution; no lock is held across
/// a network call. Concurrent callers that observe a stale token may each
/// run a renewal, in which case the last completed exchange wins.
pub struct SessionManager<T: ?Sized, C = SystemClock> {
    transport: Arc<T>,
    clock: C,
    discovery_endpoint: Url,
    credentials: MerchantCredentials,
    discovery: RwLock<Option<Arc<DiscoveryDocument>>>,
    token: RwLock<Option<TokenRecord>>,
    initialized: AtomicBool,
}

impl<T, C> SessionManager<T, C>
where
    T: HttpTransport + ?Sized,
    C: Clock,
{
    /// Create an uninitialized session manager
    ///
    /// # Arguments
    /// * `discovery_endpoint` - URL of the OIDC discovery document
    /// * `credentials` - Merchant client id/secret and refresh token
    /// * `transport` - HTTP capability shared with the API client
    /// * `clock` - Time source for watermark decisions
    #[must_use]
    pub fn new(
        discovery_endpoint: Url,
        credentials: MerchantCredentials,
        transport: Arc<T>,
        clock: C,
    ) -> Self {
        Self {
            transport,
            clock,
            discovery_endpoint,
            credentials,
            discovery: RwLock::new(None),
            token: RwLock::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Fetch discovery metadata and perform the first token exchange
    ///
    /// Calling this again re-runs both steps unconditionally. A failed
    /// re-initialization leaves a previously ready session ready.
    ///
    /// # Errors
    /// - [`SessionError::Discovery`] if the discovery document cannot be
    ///   fetched or parsed
    /// - [`SessionError::TokenRenewalFailed`] if the token exchange fails
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let document = self.fetch_discovery().await.map_err(|source| {
            warn!(endpoint = %self.discovery_endpoint, error = %source, "discovery failed");
            SessionError::Discovery { endpoint: self.discovery_endpoint.to_string(), source }
        })?;

        debug!(token_endpoint = %document.token_endpoint, "discovery document loaded");
        *self.discovery.write().await = Some(Arc::new(document));

        self.renew().await?;
        self.initialized.store(true, Ordering::Release);

        info!("session initialized");
        Ok(())
    }

    /// Whether `initialize()` has completed successfully at least once
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Return a non-stale access token, renewing first if the watermark has
    /// passed
    ///
    /// # Errors
    /// - [`SessionError::NotInitialized`] before a successful `initialize()`
    ///   (no HTTP call is made)
    /// - [`SessionError::TokenRenewalFailed`] if a needed renewal fails
    pub async fn ensure_fresh_token(&self) -> Result<String, SessionError> {
        if !self.is_initialized() {
            return Err(SessionError::NotInitialized);
        }

        let now = self.clock.now();
        let cached = {
            let token = self.token.read().await;
            token
                .as_ref()
                .filter(|record| !record.is_stale(now))
                .map(|record| record.access_token().to_owned())
        };

        match cached {
            Some(access_token) => Ok(access_token),
            None => {
                debug!("access token past watermark, renewing");
                self.renew().await
            }
        }
    }

    /// Exchange the refresh token and swap in the new record
    ///
    /// Returns the new access token. On failure the stored record is left as
    /// it was.
    async fn renew(&self) -> Result<String, SessionError> {
        let token_endpoint = {
            let discovery = self.discovery.read().await;
            discovery
                .as_ref()
                .map(|document| document.token_endpoint.clone())
                .ok_or(SessionError::NotInitialized)?
        };

        let response = self.exchange_refresh_token(&token_endpoint).await.map_err(|source| {
            warn!(error = %source, "access token renewal failed");
            SessionError::TokenRenewalFailed { source }
        })?;

        let record = TokenRecord::new(response, self.clock.now());
        let access_token = record.access_token().to_owned();
        let expires_at = record.expires_at();
        *self.token.write().await = Some(record);

        info!(%expires_at, "access token renewed");
        Ok(access_token)
    }

    async fn fetch_discovery(&self) -> Result<DiscoveryDocument, ExchangeFailure> {
        let request = TransportRequest::get(self.discovery_endpoint.clone())
            .with_header("accept", "application/json");

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(ExchangeFailure::Status {
                status: response.status(),
                body: response.text().into_owned(),
            });
        }

        Ok(response.json()?)
    }

    async fn exchange_refresh_token(
        &self,
        token_endpoint: &Url,
    ) -> Result<TokenResponse, ExchangeFailure> {
        let request = TransportRequest::post(token_endpoint.clone())
            .with_header("accept", "application/json")
            .with_form([
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ]);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(ExchangeFailure::Status {
                status: response.status(),
                body: response.text().into_owned(),
            });
        }

        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::session.
    use std::error::Error as _;
    use std::time::Duration;

    use chrono::TimeDelta;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{MockClock, MockTransport};

    const DISCOVERY_URL: &str = "https://auth.example.com/.well-known/openid-configuration";
    const TOKEN_URL: &str = "https://auth.example.com/token";

    fn discovery_body() -> String {
        serde_json::json!({ "token_endpoint": TOKEN_URL }).to_string()
    }

    fn token_body(access_token: &str, expires_in: u64) -> String {
        serde_json::json!({
            "id_token": "id-token",
            "access_token": access_token,
            "expires_in": expires_in,
            "token_type": "Bearer",
            "refresh_token": "rotated-refresh",
            "scope": "openid subscriptions"
        })
        .to_string()
    }

    fn create_test_manager(
        transport: &MockTransport,
        clock: &MockClock,
    ) -> SessionManager<MockTransport, MockClock> {
        SessionManager::new(
            Url::parse(DISCOVERY_URL).unwrap(),
            MerchantCredentials::new("merchant-client", "merchant-secret", "refresh-123", "prov-1"),
            Arc::new(transport.clone()),
            clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_new_manager_is_uninitialized() {
        let transport = MockTransport::new();
        let manager = create_test_manager(&transport, &MockClock::new());

        assert!(!manager.is_initialized());
    }

    #[tokio::test]
    async fn test_guard_before_initialize_makes_no_http_calls() {
        let transport = MockTransport::new();
        let manager = create_test_manager(&transport, &MockClock::new());

        let result = manager.ensure_fresh_token().await;

        assert!(matches!(result, Err(SessionError::NotInitialized)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_fetches_discovery_then_token() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 200, &token_body("abc", 3600));
        let manager = create_test_manager(&transport, &MockClock::new());

        manager.initialize().await.unwrap();

        assert!(manager.is_initialized());
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url.as_str(), DISCOVERY_URL);
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].url.as_str(), TOKEN_URL);
    }

    #[tokio::test]
    async fn test_token_request_is_form_encoded_refresh_grant() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 200, &token_body("abc", 3600));
        let manager = create_test_manager(&transport, &MockClock::new());

        manager.initialize().await.unwrap();

        let token_request = transport.last_request().unwrap();
        assert_eq!(
            token_request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            token_request.body.as_deref(),
            Some(
                "grant_type=refresh_token&client_id=merchant-client\
                 &client_secret=merchant-secret&refresh_token=refresh-123"
            )
        );
    }

    #[tokio::test]
    async fn test_watermark_is_half_of_expires_in() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 200, &token_body("abc", 3600));
        let clock = MockClock::new();
        let manager = create_test_manager(&transport, &clock);

        manager.initialize().await.unwrap();

        let token = manager.token.read().await;
        let record = token.as_ref().unwrap();
        assert_eq!(record.issued_at(), clock.now());
        assert_eq!(record.expires_at(), clock.now() + TimeDelta::seconds(1800));
    }

    #[tokio::test]
    async fn test_fresh_token_skips_renewal() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 200, &token_body("abc", 100));
        let clock = MockClock::new();
        let manager = create_test_manager(&transport, &clock);
        manager.initialize().await.unwrap();

        clock.advance(Duration::from_secs(49));
        let token = manager.ensure_fresh_token().await.unwrap();

        assert_eq!(token, "abc");
        assert_eq!(transport.request_count(TOKEN_URL), 1);
    }

    #[tokio::test]
    async fn test_stale_token_triggers_exactly_one_renewal() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response_sequence(
            TOKEN_URL,
            vec![(200, token_body("abc", 100).as_str()), (200, token_body("def", 100).as_str())],
        );
        let clock = MockClock::new();
        let manager = create_test_manager(&transport, &clock);
        manager.initialize().await.unwrap();

        clock.advance(Duration::from_secs(51));
        let token = manager.ensure_fresh_token().await.unwrap();

        assert_eq!(token, "def");
        assert_eq!(transport.request_count(TOKEN_URL), 2);
        assert_eq!(transport.request_count(DISCOVERY_URL), 1);

        // the renewed token carries a new watermark
        let again = manager.ensure_fresh_token().await.unwrap();
        assert_eq!(again, "def");
        assert_eq!(transport.request_count(TOKEN_URL), 2);
    }

    #[tokio::test]
    async fn test_malformed_renewal_keeps_previous_record() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response_sequence(
            TOKEN_URL,
            vec![(200, token_body("abc", 100).as_str()), (200, "<html>not json</html>")],
        );
        let clock = MockClock::new();
        let manager = create_test_manager(&transport, &clock);
        manager.initialize().await.unwrap();
        let before = manager.token.read().await.clone();

        clock.advance(Duration::from_secs(60));
        let result = manager.ensure_fresh_token().await;

        assert!(matches!(result, Err(SessionError::TokenRenewalFailed { .. })));
        let after = manager.token.read().await.clone();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_missing_fields_is_renewal_failure() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 200, r#"{"token_type":"Bearer"}"#);
        let manager = create_test_manager(&transport, &MockClock::new());

        let err = manager.initialize().await.unwrap_err();

        assert!(matches!(err, SessionError::TokenRenewalFailed { .. }));
        assert!(!manager.is_initialized());
        let cause = err.source().unwrap();
        assert!(cause.to_string().contains("malformed response body"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_renewal_failure() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_failure(TOKEN_URL, "connection refused");
        let manager = create_test_manager(&transport, &MockClock::new());

        let err = manager.initialize().await.unwrap_err();

        match err {
            SessionError::TokenRenewalFailed { source: ExchangeFailure::Transport(inner) } => {
                assert!(inner.to_string().contains("connection refused"));
            }
            other => panic!("expected renewal failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_renewal_failure() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response(TOKEN_URL, 400, r#"{"error":"invalid_grant"}"#);
        let manager = create_test_manager(&transport, &MockClock::new());

        let err = manager.initialize().await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::TokenRenewalFailed { source: ExchangeFailure::Status { status: 400, .. } }
        ));
    }

    #[tokio::test]
    async fn test_discovery_non_json_fails_initialize() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, "not json");
        let manager = create_test_manager(&transport, &MockClock::new());

        let err = manager.initialize().await.unwrap_err();

        assert!(matches!(err, SessionError::Discovery { source: ExchangeFailure::Body(_), .. }));
        assert!(!manager.is_initialized());
        assert_eq!(transport.request_count(TOKEN_URL), 0);
    }

    #[tokio::test]
    async fn test_discovery_transport_failure_fails_initialize() {
        let transport = MockTransport::new();
        transport.add_failure(DISCOVERY_URL, "dns failure");
        let manager = create_test_manager(&transport, &MockClock::new());

        let err = manager.initialize().await.unwrap_err();

        assert!(matches!(err, SessionError::Discovery { .. }));
        assert!(err.to_string().contains(DISCOVERY_URL));
    }

    #[tokio::test]
    async fn test_reinitialize_reruns_discovery_and_renewal() {
        let transport = MockTransport::new();
        transport.add_response(DISCOVERY_URL, 200, &discovery_body());
        transport.add_response_sequence(
            TOKEN_URL,
            vec![
                (200, token_body("first", 3600).as_str()),
                (200, token_body("second", 3600).as_str()),
            ],
        );
        let manager = create_test_manager(&transport, &MockClock::new());

        manager.initialize().await.unwrap();
        manager.initialize().await.unwrap();

        assert_eq!(transport.request_count(DISCOVERY_URL), 2);
        assert_eq!(transport.request_count(TOKEN_URL), 2);
        assert_eq!(manager.ensure_fresh_token().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_failed_reinitialize_keeps_session_ready() {
        let transport = MockTransport::new();
        transport.add_response_sequence(
            DISCOVERY_URL,
            vec![(200, discovery_body().as_str()), (503, "maintenance")],
        );
        transport.add_response(TOKEN_URL, 200, &token_body("abc", 3600));
        let manager = create_test_manager(&transport, &MockClock::new());
        manager.initialize().await.unwrap();

        let result = manager.initialize().await;

        assert!(matches!(
            result,
            Err(SessionError::Discovery { source: ExchangeFailure::Status { status: 503, .. }, .. })
        ));
        assert!(manager.is_initialized());
        assert_eq!(manager.ensure_fresh_token().await.unwrap(), "abc");
    }
}
