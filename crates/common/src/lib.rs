//! Shared building blocks for the subscriptions client.
//!
//! # Layout
//!
//! - [`http`]: the injected transport capability and its request/response
//!   types
//! - [`time`]: clock abstraction used for token expiry decisions
//! - [`auth`]: the session manager (OIDC discovery + refresh-token renewal)
//! - `testing` (feature `test-utils`): mock transport and mock clock
//!
//! The crate performs no I/O of its own; every network call goes through an
//! [`http::HttpTransport`] supplied by the caller.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod http;
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    DiscoveryDocument, ExchangeFailure, MerchantCredentials, SessionError, SessionManager,
    TokenRecord, TokenResponse,
};
pub use http::{HttpMethod, HttpTransport, TransportError, TransportRequest, TransportResponse};
pub use time::{Clock, SystemClock};
