//! Mock implementations of the transport capability
//!
//! [`MockTransport`] answers requests from a per-URL script and records every
//! request it receives, so tests can assert on exactly what went over the
//! wire without a socket.

// Test mocks: failures surface through return types or panicking asserts
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::http::{HttpTransport, TransportError, TransportRequest, TransportResponse};

type Scripted = Result<TransportResponse, String>;
type ResponseMap = Arc<Mutex<HashMap<String, Scripted>>>;
type ResponseSequenceMap = Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>;
type RequestLog = Arc<Mutex<Vec<TransportRequest>>>;

/// Mock HTTP transport for testing
///
/// Responses are keyed by the full request URL. A queued sequence for a URL
/// is consumed first; once it is empty the sticky response (if any) is used.
/// Clones share the same script and request log.
///
/// # Examples
///
/// ```
/// use subscriptions_common::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.add_response_sequence(
///     "https://auth.example.com/token",
///     vec![(200, "first"), (500, "second")],
/// );
/// assert!(transport.requests().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: ResponseMap,
    response_sequences: ResponseSequenceMap,
    requests: RequestLog,
}

impl MockTransport {
    /// Create a mock transport with no scripted responses
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `url` with `status` and `body`
    pub fn add_response(&self, url: &str, status: u16, body: &str) {
        self.responses.lock().insert(url.to_string(), Ok(TransportResponse::new(status, body)));
    }

    /// Answer every request to `url` with `body` serialized as JSON
    pub fn add_json(&self, url: &str, status: u16, body: &serde_json::Value) {
        self.add_response(url, status, &body.to_string());
    }

    /// Queue responses for `url`, returned one per call in order
    pub fn add_response_sequence(&self, url: &str, responses: Vec<(u16, &str)>) {
        let sequence =
            responses.into_iter().map(|(status, body)| Ok(TransportResponse::new(status, body)));
        self.response_sequences.lock().entry(url.to_string()).or_default().extend(sequence);
    }

    /// Fail every request to `url` as if the connection could not be made
    pub fn add_failure(&self, url: &str, message: &str) {
        self.responses.lock().insert(url.to_string(), Err(message.to_string()));
    }

    /// All requests received so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for `url`
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|req| req.url.as_str() == url).count()
    }

    /// Most recent request
    #[must_use]
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    /// Forget recorded requests (the script is kept)
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn next_response(&self, url: &str) -> Option<Scripted> {
        if let Some(next) =
            self.response_sequences.lock().get_mut(url).and_then(VecDeque::pop_front)
        {
            return Some(next);
        }
        self.responses.lock().get(url).cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = request.url.to_string();
        self.requests.lock().push(request);

        match self.next_response(&url) {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Request(message)),
            None => Err(TransportError::Request(format!("No response configured for URL: {url}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use url::Url;

    use super::*;

    const URL: &str = "https://api.example.com/things";

    fn get() -> TransportRequest {
        TransportRequest::get(Url::parse(URL).unwrap())
    }

    #[tokio::test]
    async fn test_sticky_response_repeats() {
        let transport = MockTransport::new();
        transport.add_response(URL, 200, "ok");

        for _ in 0..3 {
            let response = transport.execute(get()).await.unwrap();
            assert_eq!(response.status(), 200);
            assert_eq!(response.text(), "ok");
        }
        assert_eq!(transport.request_count(URL), 3);
    }

    #[tokio::test]
    async fn test_sequence_is_consumed_before_sticky() {
        let transport = MockTransport::new();
        transport.add_response(URL, 200, "fallback");
        transport.add_response_sequence(URL, vec![(201, "first"), (404, "second")]);

        assert_eq!(transport.execute(get()).await.unwrap().status(), 201);
        assert_eq!(transport.execute(get()).await.unwrap().status(), 404);
        assert_eq!(transport.execute(get()).await.unwrap().text(), "fallback");
    }

    #[tokio::test]
    async fn test_unscripted_url_fails() {
        let transport = MockTransport::new();

        let err = transport.execute(get()).await.unwrap_err();

        assert!(err.to_string().contains("No response configured"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_transport_error() {
        let transport = MockTransport::new();
        transport.add_failure(URL, "connection reset");

        let err = transport.execute(get()).await.unwrap_err();

        assert!(matches!(err, TransportError::Request(ref msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_clones_share_log_and_script() {
        let transport = MockTransport::new();
        let clone = transport.clone();
        clone.add_json(URL, 200, &serde_json::json!({ "id": 1 }));

        let response = transport.execute(get()).await.unwrap();

        assert_eq!(response.json::<serde_json::Value>().unwrap()["id"], 1);
        assert_eq!(clone.last_request().unwrap().url.as_str(), URL);

        clone.clear_requests();
        assert!(transport.requests().is_empty());
    }
}
