use std::fmt;

use serde::{Deserialize, Serialize};
use subscriptions_common::MerchantCredentials;
use url::Url;

/// Everything the client needs to talk to the provider
///
/// All fields are required; there are no defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfiguration {
    /// OIDC discovery document URL
    pub discovery_endpoint: Url,

    /// Base URL of the business API (paths are appended below
    /// `/api/providers/{provider_id}`)
    pub api_endpoint: Url,

    /// Merchant credentials for the refresh-token grant
    pub merchant: MerchantCredentials,

    /// Application credentials sent as gateway headers on business calls
    pub application: ApplicationCredentials,
}

/// Application (gateway) credentials
///
/// Sent as `x-ibm-client-id` / `x-ibm-client-secret` on every business call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ApplicationCredentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }
}

impl fmt::Debug for ApplicationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
