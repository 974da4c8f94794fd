//! OIDC types and structures
//!
//! Defines the discovery document, the raw token endpoint response and the
//! derived [`TokenRecord`] that the session manager caches.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Merchant credentials used for the refresh-token grant
///
/// `provider_id` is not sent to the token endpoint; it parameterizes the
/// business endpoint URLs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantCredentials {
    /// OIDC client id issued to the merchant
    pub client_id: String,

    /// OIDC client secret issued to the merchant
    pub client_secret: String,

    /// Long-lived refresh token
    pub refresh_token: String,

    /// Provider (merchant) identifier used in API paths
    pub provider_id: String,
}

impl MerchantCredentials {
    /// Create merchant credentials
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            provider_id: provider_id.into(),
        }
    }
}

impl fmt::Debug for MerchantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("provider_id", &self.provider_id)
            .finish()
    }
}

/// OpenID Connect discovery metadata
///
/// Only `token_endpoint` is required; the remaining well-known fields are
/// kept for diagnostics and everything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Token endpoint used for the refresh-token grant
    pub token_endpoint: Url,

    /// Issuer identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Authorization endpoint (unused by this client)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// JWKS location (unused by this client)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Additional metadata fields not modelled above
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Token endpoint response (RFC 6749 §5.1 plus the OIDC `id_token`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the business endpoints
    pub access_token: String,

    /// Advertised lifetime in seconds
    pub expires_in: u64,

    /// OIDC ID token
    #[serde(default)]
    pub id_token: Option<String>,

    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,

    /// Refresh token echoed or rotated by the provider
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Granted scopes (space-separated)
    #[serde(default)]
    pub scope: Option<String>,
}

/// Cached token with its renewal watermark
///
/// The watermark sits at half of the advertised lifetime:
/// `expires_at = issued_at + expires_in / 2`. Records are never mutated;
/// a renewal replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    response: TokenResponse,
    access_token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Derive a record from a token response received at `issued_at`
    #[must_use]
    pub fn new(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at
            .checked_add_signed(half_life(response.expires_in))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let access_token = response.access_token.clone();

        Self { response, access_token, issued_at, expires_at }
    }

    /// Access token string
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Raw provider response
    #[must_use]
    pub const fn response(&self) -> &TokenResponse {
        &self.response
    }

    /// When the token was received
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Renewal watermark
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `true` once `now` has reached the watermark
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before the watermark (negative once stale)
    #[must_use]
    pub fn seconds_until_stale(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }
}

/// Half of `expires_in` seconds, exact to the millisecond
fn half_life(expires_in: u64) -> TimeDelta {
    let millis = i64::try_from(expires_in.saturating_mul(500)).unwrap_or(i64::MAX);
    TimeDelta::try_milliseconds(millis).unwrap_or(TimeDelta::MAX)
}
