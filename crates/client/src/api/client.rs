//! Subscriptions API client
//!
//! Every operation follows the same shape: run the session guard, build the
//! URL, attach the JSON body and the standard headers, issue exactly one
//! transport call, decode the outcome. Nothing is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use subscriptions_common::http::CONTENT_TYPE_JSON;
use subscriptions_common::{
    Clock, HttpTransport, SessionError, SessionManager, SystemClock, TransportError,
    TransportRequest, TransportResponse,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::endpoints::Endpoints;
use super::errors::ApiError;
use super::types::{
    AgreementCreated, AgreementRequest, OneOffPaymentCreated, OneOffPaymentRequest,
    PaymentRequest, PaymentRequestsResult, ProviderResponse, RefundCreated, RefundRequest,
    UpstreamError,
};
use crate::config::{ApplicationCredentials, ClientConfiguration};
use crate::http::ReqwestTransport;

const HEADER_CLIENT_ID: &str = "x-ibm-client-id";
const HEADER_CLIENT_SECRET: &str = "x-ibm-client-secret";

/// HTTP status the provider uses to acknowledge a capture
const CAPTURED: u16 = 204;

/// Merchant-side client for the subscriptions API
///
/// Construct it, call [`initialize`](Self::initialize) once, then use the
/// business operations. Tokens are renewed transparently.
///
/// # Examples
///
/// ```no_run
/// use subscriptions_client::{config, SubscriptionsClient};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SubscriptionsClient::with_reqwest(config::load()?)?;
/// client.initialize().await?;
/// let captured = client.capture_one_off_payment("agreement-id", "payment-id").await?;
/// # let _ = captured;
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionsClient<T: ?Sized, C = SystemClock> {
    transport: Arc<T>,
    session: SessionManager<T, C>,
    endpoints: Endpoints,
    application: ApplicationCredentials,
}

impl SubscriptionsClient<ReqwestTransport> {
    /// Create a client backed by the default `reqwest` transport
    ///
    /// # Errors
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    pub fn with_reqwest(config: ClientConfiguration) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::new(config, transport))
    }
}

impl<T> SubscriptionsClient<T>
where
    T: HttpTransport + ?Sized,
{
    /// Create a client with an injected transport
    #[must_use]
    pub fn new(config: ClientConfiguration, transport: Arc<T>) -> Self {
        Self::with_clock(config, transport, SystemClock)
    }
}

impl<T, C> SubscriptionsClient<T, C>
where
    T: HttpTransport + ?Sized,
    C: Clock,
{
    /// Create a client with an injected transport and time source
    #[must_use]
    pub fn with_clock(config: ClientConfiguration, transport: Arc<T>, clock: C) -> Self {
        let ClientConfiguration { discovery_endpoint, api_endpoint, merchant, application } =
            config;
        let endpoints = Endpoints::new(api_endpoint, merchant.provider_id.clone());
        let session =
            SessionManager::new(discovery_endpoint, merchant, Arc::clone(&transport), clock);

        Self { transport, session, endpoints, application }
    }

    /// Whether `initialize()` has completed successfully
    #[must_use]
    pub fn initialized(&self) -> bool {
        self.session.is_initialized()
    }

    /// Fetch discovery metadata and obtain the first access token
    ///
    /// # Errors
    /// Returns [`SessionError`] if discovery or the token exchange fails.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        self.session.initialize().await
    }

    /// Session manager backing this client
    #[must_use]
    pub const fn session(&self) -> &SessionManager<T, C> {
        &self.session
    }

    /// Create a subscription agreement
    ///
    /// # Errors
    /// Returns [`ApiError`] if no response was obtained or a 2xx body could
    /// not be decoded. Provider rejections come back as
    /// [`ProviderResponse::Rejected`].
    #[instrument(skip_all, fields(plan = %request.plan))]
    pub async fn create_agreement(
        &self,
        request: &AgreementRequest,
    ) -> Result<ProviderResponse<AgreementCreated>, ApiError> {
        let token = self.session.ensure_fresh_token().await?;
        let url = self.endpoints.agreements()?;
        let response = self.post(url, &token, Some(request)).await?;
        decode("create_agreement", &response)
    }

    /// Submit a batch of payment requests in a single call
    ///
    /// The provider's accepted/rejected partition is returned as-is.
    ///
    /// # Errors
    /// See [`create_agreement`](Self::create_agreement).
    #[instrument(skip_all, fields(count = requests.len()))]
    pub async fn create_payment_requests(
        &self,
        requests: &[PaymentRequest],
    ) -> Result<ProviderResponse<PaymentRequestsResult>, ApiError> {
        let token = self.session.ensure_fresh_token().await?;
        let url = self.endpoints.payment_requests()?;
        let response = self.post(url, &token, Some(requests)).await?;
        let outcome: ProviderResponse<PaymentRequestsResult> =
            decode("create_payment_requests", &response)?;

        if let ProviderResponse::Accepted(result) = &outcome {
            info!(
                pending = result.pending_payments.len(),
                rejected = result.rejected_payment_requests.len(),
                "payment requests submitted"
            );
        }
        Ok(outcome)
    }

    /// Request a one-off payment on an existing agreement
    ///
    /// # Errors
    /// See [`create_agreement`](Self::create_agreement).
    #[instrument(skip_all, fields(agreement_id = %agreement_id))]
    pub async fn create_one_off_payment(
        &self,
        agreement_id: &str,
        request: &OneOffPaymentRequest,
    ) -> Result<ProviderResponse<OneOffPaymentCreated>, ApiError> {
        let token = self.session.ensure_fresh_token().await?;
        let url = self.endpoints.one_off_payments(agreement_id)?;
        let response = self.post(url, &token, Some(request)).await?;
        decode("create_one_off_payment", &response)
    }

    /// Capture a reserved one-off payment
    ///
    /// Returns `true` only for HTTP 204. Any other status yields `false`; the
    /// response body is never read.
    ///
    /// # Errors
    /// Returns [`ApiError`] if the session guard fails or no response was
    /// received.
    #[instrument(skip_all, fields(agreement_id = %agreement_id, payment_id = %payment_id))]
    pub async fn capture_one_off_payment(
        &self,
        agreement_id: &str,
        payment_id: &str,
    ) -> Result<bool, ApiError> {
        let token = self.session.ensure_fresh_token().await?;
        let url = self.endpoints.capture_one_off_payment(agreement_id, payment_id)?;
        let response = self.post::<()>(url, &token, None).await?;

        let captured = response.status() == CAPTURED;
        if !captured {
            warn!(status = response.status(), "capture not acknowledged");
        }
        Ok(captured)
    }

    /// Refund a payment, fully or partially
    ///
    /// # Errors
    /// See [`create_agreement`](Self::create_agreement).
    #[instrument(skip_all, fields(agreement_id = %agreement_id, payment_id = %payment_id))]
    pub async fn refund_payment(
        &self,
        agreement_id: &str,
        payment_id: &str,
        request: &RefundRequest,
    ) -> Result<ProviderResponse<RefundCreated>, ApiError> {
        let token = self.session.ensure_fresh_token().await?;
        let url = self.endpoints.refunds(agreement_id, payment_id)?;
        let response = self.post(url, &token, Some(request)).await?;
        decode("refund_payment", &response)
    }

    async fn post<B>(
        &self,
        url: Url,
        access_token: &str,
        body: Option<&B>,
    ) -> Result<TransportResponse, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut request = TransportRequest::post(url);
        if let Some(body) = body {
            request = request.with_json(body).map_err(ApiError::Serialize)?;
        }

        let request = request
            .with_header("content-type", CONTENT_TYPE_JSON)
            .with_header(HEADER_CLIENT_ID, self.application.client_id.as_str())
            .with_header(HEADER_CLIENT_SECRET, self.application.client_secret.as_str())
            .with_bearer_auth(access_token);

        debug!(url = %request.url, "POST request");
        Ok(self.transport.execute(request).await?)
    }
}

fn decode<R: DeserializeOwned>(
    operation: &'static str,
    response: &TransportResponse,
) -> Result<ProviderResponse<R>, ApiError> {
    let status = response.status();
    if !response.is_success() {
        let rejection = UpstreamError::from_response(response);
        warn!(operation, status, message = rejection.message(), "provider rejected request");
        return Ok(ProviderResponse::Rejected(rejection));
    }

    let body = response.json().map_err(|source| ApiError::Decode { operation, status, source })?;
    info!(operation, status, "request accepted");
    Ok(ProviderResponse::Accepted(body))
}
