//! Scripted transport standing in for the network.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use unrest_client::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Fetch-like transport driven by a scripted handler.
///
/// Every exchange sleeps for an artificial delay (25 ms by default) so
/// tests can observe the loading state and race concurrent requests, then
/// records the request and answers from the handler.
pub struct MockTransport {
    handler: Handler,
    delay: Duration,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Transport answering from `handler`.
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::from_millis(25),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Transport answering every request with `200` and `body`.
    pub fn json_ok(body: Value) -> Self {
        Self::new(move |_| Ok(HttpResponse::json(200, &body)))
    }

    /// Transport answering `200` with a body computed from the request.
    pub fn respond_with(body: impl Fn(&HttpRequest) -> Value + Send + Sync + 'static) -> Self {
        Self::new(move |request| Ok(HttpResponse::json(200, &body(request))))
    }

    /// Transport answering every request with `status` and `body`.
    pub fn status(status: u16, body: Value) -> Self {
        Self::new(move |_| Ok(HttpResponse::json(status, &body)))
    }

    /// Change the artificial delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of exchanges performed.
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The last request seen, if any.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tokio::time::sleep(self.delay).await;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        (self.handler)(&request)
    }
}
