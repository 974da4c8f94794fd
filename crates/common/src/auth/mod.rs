//! OIDC session management for the subscriptions API
//!
//! The provider authenticates merchants with a long-lived refresh token that
//! is exchanged for short-lived access tokens at an OIDC token endpoint. The
//! token endpoint itself is located through a discovery document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  SessionManager  │  discovery + token lifecycle
//! └────────┬─────────┘
//!          │
//!          ├──► HttpTransport   (injected, one call per exchange)
//!          └──► Clock           (expiry watermark decisions)
//! ```
//!
//! # Lifecycle
//!
//! 1. [`SessionManager::initialize`] fetches the discovery document and
//!    performs the first refresh-token exchange.
//! 2. Every business call runs [`SessionManager::ensure_fresh_token`], which
//!    renews the token once its expiry watermark (half of the advertised
//!    lifetime) has passed.
//!
//! # Module Organization
//!
//! - **[`types`]**: discovery document, token response, token record,
//!   merchant credentials
//! - **[`session`]**: the session manager and its error type

pub mod session;
pub mod types;

pub use session::{ExchangeFailure, SessionError, SessionManager};
pub use types::{DiscoveryDocument, MerchantCredentials, TokenRecord, TokenResponse};
