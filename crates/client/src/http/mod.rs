//! Default transport implementation
//!
//! [`ReqwestTransport`] is the production [`HttpTransport`] used by
//! [`SubscriptionsClient::with_reqwest`](crate::SubscriptionsClient::with_reqwest).
//!
//! [`HttpTransport`]: subscriptions_common::HttpTransport

pub mod client;

pub use client::{ReqwestTransport, ReqwestTransportBuilder};
