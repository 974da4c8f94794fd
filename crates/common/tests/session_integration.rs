//! Integration tests for the session manager
//!
//! Drives the public API through the scripted mock transport and a manually
//! advanced clock.

use std::error::Error as _;
use std::sync::Arc;

use async_trait::async_trait;
use subscriptions_common::testing::{MockClock, MockTransport};
use subscriptions_common::{
    ExchangeFailure, HttpMethod, HttpTransport, MerchantCredentials, SessionError,
    SessionManager, TransportError, TransportRequest, TransportResponse,
};
use url::Url;

const DISCOVERY_URL: &str = "https://login.example.com/.well-known/openid-configuration";
const TOKEN_URL: &str = "https://login.example.com/oauth2/token";

fn credentials() -> MerchantCredentials {
    MerchantCredentials::new("merchant-client", "merchant-secret", "long-lived-refresh", "prov-42")
}

fn token_json(access_token: &str, expires_in: u64) -> String {
    serde_json::json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "Bearer",
        "id_token": "header.payload.signature"
    })
    .to_string()
}

fn scripted_transport() -> MockTransport {
    let transport = MockTransport::new();
    transport.add_json(
        DISCOVERY_URL,
        200,
        &serde_json::json!({
            "issuer": "https://login.example.com",
            "token_endpoint": TOKEN_URL,
            "jwks_uri": "https://login.example.com/keys"
        }),
    );
    transport
}

fn manager(
    transport: &MockTransport,
    clock: &MockClock,
) -> SessionManager<MockTransport, MockClock> {
    SessionManager::new(
        Url::parse(DISCOVERY_URL).unwrap(),
        credentials(),
        Arc::new(transport.clone()),
        clock.clone(),
    )
}

/// A full session lifecycle: initialize, reuse the token while fresh, renew
/// once the half-life watermark passes.
#[tokio::test]
async fn test_session_lifecycle() {
    let transport = scripted_transport();
    transport.add_response_sequence(
        TOKEN_URL,
        vec![
            (200, token_json("token-1", 3600).as_str()),
            (200, token_json("token-2", 3600).as_str()),
        ],
    );
    let clock = MockClock::new();
    let session = manager(&transport, &clock);

    session.initialize().await.unwrap();
    assert!(session.is_initialized());

    clock.advance_secs(1799);
    assert_eq!(session.ensure_fresh_token().await.unwrap(), "token-1");
    assert_eq!(transport.request_count(TOKEN_URL), 1);

    clock.advance_secs(1);
    assert_eq!(session.ensure_fresh_token().await.unwrap(), "token-2");
    assert_eq!(transport.request_count(TOKEN_URL), 2);
    assert_eq!(transport.request_count(DISCOVERY_URL), 1);
}

/// Every renewal presents the configured refresh token, even when the
/// provider hands back a rotated one.
#[tokio::test]
async fn test_renewal_always_uses_configured_refresh_token() {
    let transport = scripted_transport();
    transport.add_json(
        TOKEN_URL,
        200,
        &serde_json::json!({
            "access_token": "abc",
            "expires_in": 10,
            "refresh_token": "rotated-refresh"
        }),
    );
    let clock = MockClock::new();
    let session = manager(&transport, &clock);

    session.initialize().await.unwrap();
    clock.advance_secs(6);
    session.ensure_fresh_token().await.unwrap();

    let token_requests: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|req| req.method == HttpMethod::Post)
        .collect();
    assert_eq!(token_requests.len(), 2);
    for request in token_requests {
        let body = request.body.unwrap();
        assert!(body.contains("refresh_token=long-lived-refresh"));
        assert!(!body.contains("rotated-refresh"));
    }
}

/// A failed renewal surfaces as a single error kind and a later call can
/// still recover.
#[tokio::test]
async fn test_failed_renewal_then_recovery() {
    let transport = scripted_transport();
    transport.add_response_sequence(
        TOKEN_URL,
        vec![
            (200, token_json("first", 100).as_str()),
            (500, "upstream unavailable"),
            (200, token_json("second", 100).as_str()),
        ],
    );
    let clock = MockClock::new();
    let session = manager(&transport, &clock);
    session.initialize().await.unwrap();

    clock.advance_secs(51);
    let err = session.ensure_fresh_token().await.unwrap_err();
    assert!(matches!(err, SessionError::TokenRenewalFailed { .. }));
    let source = err.source().and_then(|e| e.downcast_ref::<ExchangeFailure>());
    assert!(matches!(source, Some(ExchangeFailure::Status { status: 500, .. })));

    assert_eq!(session.ensure_fresh_token().await.unwrap(), "second");
}

/// Discovery answering with an error status fails initialization before any
/// token exchange.
#[tokio::test]
async fn test_discovery_error_status_blocks_initialization() {
    let transport = MockTransport::new();
    transport.add_response(DISCOVERY_URL, 404, "not found");
    let clock = MockClock::new();
    let session = manager(&transport, &clock);

    let err = session.initialize().await.unwrap_err();

    assert!(matches!(err, SessionError::Discovery { .. }));
    assert!(!session.is_initialized());
    assert_eq!(transport.requests().len(), 1);
    assert!(matches!(session.ensure_fresh_token().await, Err(SessionError::NotInitialized)));
}

/// The session can be shared across tasks behind an `Arc`.
#[tokio::test(flavor = "multi_thread")]
async fn test_shared_session_across_tasks() {
    let transport = scripted_transport();
    transport.add_response(TOKEN_URL, 200, &token_json("shared", 3600));
    let clock = MockClock::new();
    let session = Arc::new(manager(&transport, &clock));
    session.initialize().await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.ensure_fresh_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "shared");
    }
    assert_eq!(transport.request_count(TOKEN_URL), 1);
}

/// Hands control back to the executor before every request, so concurrent
/// callers interleave at the network call.
struct YieldingTransport(MockTransport);

#[async_trait]
impl HttpTransport for YieldingTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        tokio::task::yield_now().await;
        self.0.execute(request).await
    }
}

/// Two callers that both see a stale token both renew; the record written
/// last is the one kept.
#[tokio::test]
async fn test_concurrent_stale_callers_both_renew() {
    let transport = scripted_transport();
    transport.add_response_sequence(
        TOKEN_URL,
        vec![
            (200, token_json("token-1", 100).as_str()),
            (200, token_json("token-2", 100).as_str()),
            (200, token_json("token-3", 100).as_str()),
        ],
    );
    let clock = MockClock::new();
    let session = SessionManager::new(
        Url::parse(DISCOVERY_URL).unwrap(),
        credentials(),
        Arc::new(YieldingTransport(transport.clone())),
        clock.clone(),
    );
    session.initialize().await.unwrap();

    clock.advance_secs(51);
    let (first, second) = tokio::join!(session.ensure_fresh_token(), session.ensure_fresh_token());

    let mut renewed = vec![first.unwrap(), second.unwrap()];
    renewed.sort();
    assert_eq!(renewed, ["token-2", "token-3"]);
    assert_eq!(transport.request_count(TOKEN_URL), 3);

    assert_eq!(session.ensure_fresh_token().await.unwrap(), "token-3");
    assert_eq!(transport.request_count(TOKEN_URL), 3);
}
