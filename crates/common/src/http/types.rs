//! Request and response types exchanged with an [`HttpTransport`]
//!
//! [`HttpTransport`]: super::HttpTransport

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Content type for JSON request bodies
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type for form-encoded request bodies
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP methods used against the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a transport could not produce a response
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or protocol failure
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The transport's own deadline elapsed
    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    /// The request could not be built (bad header value, unserializable body)
    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),
}

/// An outbound HTTP request
///
/// Header names are stored lower-cased; lookups through [`header`] are
/// therefore case-insensitive.
///
/// [`header`]: TransportRequest::header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Request method
    pub method: HttpMethod,
    /// Absolute target URL
    pub url: Url,
    /// Header mapping (lower-cased names)
    pub headers: BTreeMap<String, String>,
    /// Optional, already-encoded body
    pub body: Option<String>,
}

impl TransportRequest {
    /// Create a request without headers or body
    #[must_use]
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self { method, url, headers: BTreeMap::new(), body: None }
    }

    /// Shorthand for a `GET` request
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Shorthand for a `POST` request
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Add (or replace) a header
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a `Bearer` authorization header
    #[must_use]
    pub fn with_bearer_auth(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {token}"))
    }

    /// Serialize `body` as JSON and set the JSON content type
    ///
    /// # Errors
    /// Returns the serializer error if `body` cannot be represented as JSON.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self.with_header("content-type", CONTENT_TYPE_JSON))
    }

    /// Encode `pairs` as `application/x-www-form-urlencoded` and set the
    /// matching content type
    #[must_use]
    pub fn with_form<'a, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let encoded = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
        self.body = Some(encoded);
        self.with_header("content-type", CONTENT_TYPE_FORM)
    }

    /// Look up a header value (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Response returned by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    status: u16,
    body: Vec<u8>,
}

impl TransportResponse {
    /// Build a response from a status code and raw body bytes
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    /// HTTP status code
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// `true` for 2xx statuses
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Raw body bytes
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8 (lossy)
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON into `T`
    ///
    /// # Errors
    /// Returns the deserializer error when the body is not valid JSON or does
    /// not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
