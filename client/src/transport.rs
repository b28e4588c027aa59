//! Transport contract and the adapter that normalizes fetch-like
//! responses.
//!
//! The injected transport only moves bytes: URL and headers in, status,
//! headers and body out. Everything this layer promises about a response
//! (JSON headers, bearer-credential round-trips, status classification,
//! the empty-404 exception, raw bodies, cancellation) lives in
//! [`TransportAdapter`], so any fetch-like implementation behaves the
//! same way.

use crate::cancel::CancelToken;
use crate::credentials::CredentialStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use unrest_core::error::ApiError;
use unrest_core::state::{Metadata, Params};
use unrest_core::verb::Verb;

/// Error produced by an [`HttpTransport`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The exchange failed before a response was produced.
    #[error("network failure: {0}")]
    Network(String),
}

/// Outgoing request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Fully assembled URL, query string included.
    pub url: String,
    /// Request verb.
    pub verb: Verb,
    /// Header map; names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body, for non-GET verbs with a payload.
    pub body: Option<String>,
}

/// Response surfaced by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// JSON response with the given status.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), "application/json".to_owned());
        Self {
            status,
            headers,
            body: serde_json::to_vec(body).unwrap_or_default(),
        }
    }

    /// Response with an explicit content type and body.
    #[must_use]
    pub fn text(status: u16, content_type: &str, body: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), content_type.to_owned());
        Self {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    /// Attach a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_owned());
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Fetch-like transport: given a request, produce status, headers and
/// body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the exchange.
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Successful response after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    /// JSON object body with the status code merged in as `code`.
    Json(Metadata),
    /// Non-JSON body returned verbatim.
    Raw {
        /// HTTP status code.
        code: u16,
        /// Response content type, if any.
        content_type: Option<String>,
        /// Raw body bytes.
        body: Vec<u8>,
    },
}

/// How a transport call settled: with a classified response, or
/// cancelled. Cancellation is a distinct outcome, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The exchange completed and the response was classified.
    Response(NormalizedResult),
    /// The cancellation token fired before (or while) the exchange
    /// settled.
    Aborted,
}

/// Thin shim between the lifecycle controller and the injected
/// transport: builds headers and body, applies the credential hook on
/// both sides of the exchange, classifies the response, and translates
/// cancellation into [`FetchOutcome::Aborted`].
pub struct TransportAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl TransportAdapter {
    /// Wrap a transport, optionally with a credential store.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Option<Arc<dyn CredentialStore>>,
    ) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Send one request and classify its settlement.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] for a status outside `[200, 300)`
    /// (except the empty-404 case on GET) and [`ApiError::Transport`]
    /// for network failures or unreadable JSON bodies.
    pub async fn send(
        &self,
        url: &str,
        verb: Verb,
        payload: Option<&Params>,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, ApiError> {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_owned(), "application/json".to_owned());
        if let Some(credential) = self.credential() {
            headers.insert("authorization".to_owned(), format!("Bearer {credential}"));
        }
        let mut body = None;
        if verb.has_body() {
            if let Some(payload) = payload {
                headers.insert("content-type".to_owned(), "application/json".to_owned());
                body = Some(Value::Object(payload.clone()).to_string());
            }
        }
        let request = HttpRequest {
            url: url.to_owned(),
            verb,
            headers,
            body,
        };

        let result = tokio::select! {
            // Check cancellation first so a pre-cancelled call never
            // reaches the wire.
            biased;
            () = cancel.cancelled() => return Ok(FetchOutcome::Aborted),
            result = self.transport.fetch(request) => result,
        };
        // A cancellation landing while the exchange settles must not
        // surface stale data, whichever way the exchange went.
        if cancel.is_cancelled() {
            return Ok(FetchOutcome::Aborted);
        }
        let response = result.map_err(|error| ApiError::Transport(error.to_string()))?;
        self.consume_credential(&response);
        Ok(FetchOutcome::Response(classify(verb, &response)?))
    }

    /// Credential to attach, if a store is configured and readable.
    fn credential(&self) -> Option<String> {
        let store = self.credentials.as_ref()?;
        match store.get() {
            Ok(credential) => credential,
            Err(error) => {
                tracing::warn!(%error, "credential store read failed, sending without credential");
                None
            }
        }
    }

    /// Consume the response side of the credential round-trip: drop the
    /// credential on 401, persist a rotated one otherwise.
    fn consume_credential(&self, response: &HttpResponse) {
        let Some(store) = &self.credentials else {
            return;
        };
        if response.status == 401 {
            if let Err(error) = store.remove() {
                tracing::warn!(%error, "failed to clear credential after 401");
            }
        } else if let Some(credential) = response.header("authorization") {
            if let Err(error) = store.set(credential) {
                tracing::warn!(%error, "failed to persist rotated credential");
            }
        }
    }
}

/// Classify a settled response per the wire contract.
fn classify(verb: Verb, response: &HttpResponse) -> Result<NormalizedResult, ApiError> {
    let code = response.status;
    let content_type = response.header("content-type").map(str::to_owned);
    let is_json = content_type
        .as_deref()
        .is_some_and(|value| value.starts_with("application/json"));

    if !(200..300).contains(&code) {
        // The backend reports an empty collection as a 404.
        if code == 404 && verb.is_get() {
            let mut metadata = Metadata::new();
            metadata.insert("code".to_owned(), Value::from(404));
            metadata.insert("occurences".to_owned(), Value::from(0));
            metadata.insert("objects".to_owned(), Value::Array(Vec::new()));
            return Ok(NormalizedResult::Json(metadata));
        }
        let description = if is_json {
            match serde_json::from_slice::<Value>(&response.body) {
                Ok(json) => json
                    .get("message")
                    .or_else(|| json.get("description"))
                    .and_then(Value::as_str)
                    .map_or_else(|| json.to_string(), str::to_owned),
                Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
            }
        } else {
            String::from_utf8_lossy(&response.body).into_owned()
        };
        return Err(ApiError::Http { code, description });
    }

    if is_json {
        let value: Value = serde_json::from_slice(&response.body)
            .map_err(|error| ApiError::Transport(format!("invalid JSON response body: {error}")))?;
        let Value::Object(mut metadata) = value else {
            return Err(ApiError::Transport(
                "response body is not a JSON object".to_owned(),
            ));
        };
        metadata.insert("code".to_owned(), Value::from(code));
        Ok(NormalizedResult::Json(metadata))
    } else {
        Ok(NormalizedResult::Raw {
            code,
            content_type,
            body: response.body.clone(),
        })
    }
}

/// Default production transport backed by [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Put => reqwest::Method::PUT,
            Verb::Post => reqwest::Method::POST,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.as_str().to_owned(), text.to_owned()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?
            .to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
