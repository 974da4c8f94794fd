//! Request and response models for the business endpoints
//!
//! Amounts are [`Decimal`] on the Rust side and plain JSON numbers on the
//! wire. Every response type keeps fields it does not model in `extra`, and
//! provider-owned fields fall back to empty when a 2xx body omits them.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subscriptions_common::TransportResponse;
use thiserror::Error;

/// Fields present in a response that are not modelled explicitly
pub type ExtraFields = HashMap<String, serde_json::Value>;

/// Link relation for the page the user is sent to for approval
pub const REL_USER_REDIRECT: &str = "user-redirect";
/// Link relation the provider redirects to after approval
pub const REL_SUCCESS_CALLBACK: &str = "success-callback";
/// Link relation the provider redirects to after rejection
pub const REL_CANCEL_CALLBACK: &str = "cancel-callback";

/// Hypermedia link (`rel` + `href`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String,
}

impl Link {
    #[must_use]
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self { rel: rel.into(), href: href.into() }
    }

    #[must_use]
    pub fn success_callback(href: impl Into<String>) -> Self {
        Self::new(REL_SUCCESS_CALLBACK, href)
    }

    #[must_use]
    pub fn cancel_callback(href: impl Into<String>) -> Self {
        Self::new(REL_CANCEL_CALLBACK, href)
    }
}

fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links.iter().find(|link| link.rel == rel).map(|link| link.href.as_str())
}

// ---------------------------------------------------------------------------
// Agreements
// ---------------------------------------------------------------------------

/// Body of `POST /agreements`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementRequest {
    /// Merchant reference for the agreement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Recurring amount; omitted for variable-amount agreements
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,

    /// ISO 4217 currency code
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Pre-fills the phone number on the approval page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone_number: Option<String>,

    /// Short plan name shown to the user
    pub plan: String,

    /// Minutes the user has to approve the agreement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timeout_minutes: Option<u32>,

    /// Success and cancel callbacks
    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_period_hours: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_notification_management: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_on: Option<bool>,

    /// One-off payment charged together with agreement approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_off_payment: Option<OneOffPaymentRequest>,
}

/// Response to `POST /agreements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementCreated {
    /// Provider-assigned agreement id
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AgreementCreated {
    /// URL the user must open to approve the agreement
    #[must_use]
    pub fn user_redirect(&self) -> Option<&str> {
        find_link(&self.links, REL_USER_REDIRECT)
    }
}

// ---------------------------------------------------------------------------
// Payment requests
// ---------------------------------------------------------------------------

/// One element of the `POST /paymentrequests` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub agreement_id: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Day the payment is charged (`YYYY-MM-DD`)
    pub due_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,

    /// Merchant reference, echoed back in the result partition
    pub external_id: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_days: Option<u32>,
}

/// Response to `POST /paymentrequests`: accepted and rejected partitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestsResult {
    #[serde(default)]
    pub pending_payments: Vec<PendingPayment>,

    #[serde(default)]
    pub rejected_payment_requests: Vec<RejectedPaymentRequest>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Payment request accepted by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    #[serde(default)]
    pub payment_id: String,

    #[serde(default)]
    pub external_id: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Payment request the provider refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPaymentRequest {
    #[serde(default)]
    pub external_id: String,

    #[serde(default)]
    pub error_description: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// One-off payments
// ---------------------------------------------------------------------------

/// Body of `POST /agreements/{id}/oneoffpayments`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneOffPaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub external_id: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timeout_minutes: Option<u32>,
}

/// Response to `POST /agreements/{id}/oneoffpayments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOffPaymentCreated {
    #[serde(default)]
    pub payment_id: String,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl OneOffPaymentCreated {
    /// URL the user must open to approve the payment
    #[must_use]
    pub fn user_redirect(&self) -> Option<&str> {
        find_link(&self.links, REL_USER_REDIRECT)
    }
}

// ---------------------------------------------------------------------------
// Refunds
// ---------------------------------------------------------------------------

/// Body of `POST /agreements/{id}/payments/{id}/refunds`
///
/// Leaving `amount` empty refunds the full payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,

    /// Where the provider posts refund status changes
    pub status_callback_url: String,

    pub external_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response to a refund request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundCreated {
    #[serde(default)]
    pub id: String,

    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// Outcome wrapper
// ---------------------------------------------------------------------------

/// Outcome of a business call that reached the provider
///
/// A non-2xx answer is a normal outcome, not an [`ApiError`]; the provider's
/// error payload is handed back untouched.
///
/// [`ApiError`]: super::ApiError
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse<T> {
    /// 2xx with a decoded body
    Accepted(T),
    /// Non-2xx with the provider's payload
    Rejected(UpstreamError),
}

impl<T> ProviderResponse<T> {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The decoded body, if accepted
    #[must_use]
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// The provider's error, if rejected
    #[must_use]
    pub const fn rejected(&self) -> Option<&UpstreamError> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(err) => Some(err),
        }
    }

    /// Convert into a `Result` so rejections can be propagated with `?`
    ///
    /// # Errors
    /// Returns the [`UpstreamError`] when the provider rejected the call.
    pub fn into_result(self) -> Result<T, UpstreamError> {
        match self {
            Self::Accepted(value) => Ok(value),
            Self::Rejected(err) => Err(err),
        }
    }
}

/// Non-2xx response from a business endpoint
///
/// `body` is the parsed JSON payload, `Null` for an empty body, or a JSON
/// string holding the raw text when the body was not JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider rejected request with HTTP {status}")]
pub struct UpstreamError {
    pub status: u16,
    pub body: serde_json::Value,
}

impl UpstreamError {
    pub(crate) fn from_response(response: &TransportResponse) -> Self {
        let body = if response.body().iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            response
                .json::<serde_json::Value>()
                .unwrap_or_else(|_| serde_json::Value::String(response.text().into_owned()))
        };

        Self { status: response.status(), body }
    }

    /// Provider error message, when the payload carries one
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        ["message", "error_description", "error"]
            .iter()
            .find_map(|key| self.body.get(key).and_then(serde_json::Value::as_str))
    }
}
