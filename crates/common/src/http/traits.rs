//! Trait for outbound HTTP execution
//!
//! Abstracts the HTTP stack so the session manager can be driven by
//! `reqwest` in production and by an in-memory mock in tests.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{TransportError, TransportRequest, TransportResponse};

/// Executes a single HTTP request.
///
/// Implementations must not retry: every call to [`execute`] maps to at most
/// one request on the wire.
///
/// [`execute`]: HttpTransport::execute
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the raw response.
    ///
    /// Non-2xx statuses are *not* errors at this level; they come back as a
    /// regular [`TransportResponse`].
    ///
    /// # Errors
    /// Returns [`TransportError`] when no response was received (connection
    /// failure, timeout, invalid request).
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request).await
    }
}
