//! API-specific error types
//!
//! A provider rejection is not an error (see
//! [`ProviderResponse`](super::ProviderResponse)); [`ApiError`] covers the
//! cases where no usable answer was obtained.

use subscriptions_common::{SessionError, TransportError};
use thiserror::Error;

/// Coarse classification of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Discovery or token renewal failed
    Authentication,
    /// No response was received
    Network,
    /// The request could not be built
    Client,
    /// The provider answered 2xx with an unexpected body
    Server,
    /// The client was used before `initialize()` or is misconfigured
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse {operation} response (HTTP {status}): {source}")]
    Decode {
        operation: &'static str,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("API endpoint cannot carry path segments: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Get the error category for this error
    #[must_use]
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Session(SessionError::NotInitialized) | Self::InvalidEndpoint(_) => {
                ApiErrorCategory::Config
            }
            Self::Session(_) => ApiErrorCategory::Authentication,
            Self::Transport(TransportError::InvalidRequest(_)) | Self::Serialize(_) => {
                ApiErrorCategory::Client
            }
            Self::Transport(_) => ApiErrorCategory::Network,
            Self::Decode { .. } => ApiErrorCategory::Server,
        }
    }
}
