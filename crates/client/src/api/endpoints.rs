//! URL templates for the business endpoints
//!
//! Every path hangs off `{api_endpoint}/api/providers/{provider_id}`. Ids are
//! appended as path segments, so they are percent-encoded rather than
//! spliced into the path.

use url::Url;

use super::errors::ApiError;

#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    api_endpoint: Url,
    provider_id: String,
}

impl Endpoints {
    pub(crate) fn new(api_endpoint: Url, provider_id: impl Into<String>) -> Self {
        Self { api_endpoint, provider_id: provider_id.into() }
    }

    /// `/agreements`
    pub(crate) fn agreements(&self) -> Result<Url, ApiError> {
        self.build(&["agreements"])
    }

    /// `/paymentrequests`
    pub(crate) fn payment_requests(&self) -> Result<Url, ApiError> {
        self.build(&["paymentrequests"])
    }

    /// `/agreements/{agreement_id}/oneoffpayments`
    pub(crate) fn one_off_payments(&self, agreement_id: &str) -> Result<Url, ApiError> {
        self.build(&["agreements", agreement_id, "oneoffpayments"])
    }

    /// `/agreements/{agreement_id}/oneoffpayments/{payment_id}/capture`
    pub(crate) fn capture_one_off_payment(
        &self,
        agreement_id: &str,
        payment_id: &str,
    ) -> Result<Url, ApiError> {
        self.build(&["agreements", agreement_id, "oneoffpayments", payment_id, "capture"])
    }

    /// `/agreements/{agreement_id}/payments/{payment_id}/refunds`
    pub(crate) fn refunds(&self, agreement_id: &str, payment_id: &str) -> Result<Url, ApiError> {
        self.build(&["agreements", agreement_id, "payments", payment_id, "refunds"])
    }

    fn build(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint(self.api_endpoint.to_string()))?
            .pop_if_empty()
            .extend(["api", "providers", self.provider_id.as_str()])
            .extend(segments);
        Ok(url)
    }
}
