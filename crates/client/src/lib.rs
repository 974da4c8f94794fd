//! # Subscriptions Client
//!
//! Merchant-side client for a payment provider's subscriptions API.
//!
//! This crate contains:
//! - Configuration loading (environment variables, JSON/TOML files)
//! - The default `reqwest` transport
//! - The operation facade: agreements, payment requests, one-off payments,
//!   captures and refunds
//!
//! Session management (OIDC discovery, refresh-token renewal) lives in
//! `subscriptions-common`; its main types are re-exported here.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod http;

// Re-export commonly used items
pub use api::{
    AgreementCreated, AgreementRequest, ApiError, ApiErrorCategory, Link, OneOffPaymentCreated,
    OneOffPaymentRequest, PaymentRequest, PaymentRequestsResult, PendingPayment,
    ProviderResponse, RefundCreated, RefundRequest, RejectedPaymentRequest, SubscriptionsClient,
    UpstreamError,
};
pub use config::{ApplicationCredentials, ClientConfiguration, ConfigError};
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use subscriptions_common::{
    Clock, HttpTransport, MerchantCredentials, SessionError, SystemClock, TransportError,
};
