//! Transport capability consumed by the session manager and the API client
//!
//! The core never talks to the network directly. Instead it builds a
//! [`TransportRequest`] (method, URL, headers, optional body) and hands it to
//! an injected [`HttpTransport`], which answers with a [`TransportResponse`]
//! exposing the status code and a JSON-decoding accessor.
//!
//! Timeouts, TLS and connection pooling are properties of the transport
//! implementation, not of this crate.

pub mod traits;
pub mod types;

pub use traits::HttpTransport;
pub use types::{
    HttpMethod, TransportError, TransportRequest, TransportResponse, CONTENT_TYPE_FORM,
    CONTENT_TYPE_JSON,
};
