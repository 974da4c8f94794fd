//! Subscriptions API client
//!
//! This module provides the merchant-facing operation facade.
//!
//! # Architecture
//!
//! - [`SubscriptionsClient`] owns the [`SessionManager`] and the injected
//!   transport
//! - Every operation runs the session guard first, then issues one request
//! - Provider rejections are returned as [`ProviderResponse::Rejected`], not
//!   as errors
//!
//! [`SessionManager`]: subscriptions_common::SessionManager

pub mod client;
mod endpoints;
pub mod errors;
pub mod types;

pub use client::SubscriptionsClient;
pub use errors::{ApiError, ApiErrorCategory};
pub use types::{
    AgreementCreated, AgreementRequest, ExtraFields, Link, OneOffPaymentCreated,
    OneOffPaymentRequest, PaymentRequest, PaymentRequestsResult, PendingPayment, ProviderResponse,
    RefundCreated, RefundRequest, RejectedPaymentRequest, UpstreamError,
};
