//! Request lifecycle controller: one fetch, from issue to settle.
//!
//! Per endpoint the state machine is `idle → loading → {success, error,
//! aborted, cached} → idle`. Only one request may be in flight per
//! endpoint; a forced request cancels and replaces the current occupant
//! (last writer wins when forces stack), a non-forced one fails fast. The
//! in-flight registry entry is removed by a drop guard so cleanup runs on
//! every exit path.

use crate::cancel::CancelToken;
use crate::config::{ErrorContext, ErrorHandler, RootPath};
use crate::store::HostStore;
use crate::transport::{FetchOutcome, NormalizedResult, TransportAdapter};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use unrest_core::environment::Clock;
use unrest_core::error::ApiError;
use unrest_core::event::{ApiEvent, EndpointEvents};
use unrest_core::route::{RouteTemplate, encode_query, strip_trailing_slashes};
use unrest_core::state::{EndpointState, Metadata, Params};
use unrest_core::verb::Verb;

/// Terminal report of one thunk run.
///
/// Callers may await the report or drop it; the endpoint state reflects
/// the same outcome either way.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The request settled with a classified response. `raw` carries the
    /// body of a non-JSON response; `objects` is absent then, and for
    /// acknowledgement-style JSON bodies.
    Success {
        /// Object list from the response.
        objects: Option<Vec<Value>>,
        /// Remaining response metadata.
        metadata: Metadata,
        /// Raw body of a non-JSON response.
        raw: Option<Vec<u8>>,
    },
    /// The cache window answered; `objects` and `metadata` are the last
    /// known state.
    Cache {
        /// Cached object list.
        objects: Vec<Value>,
        /// Cached metadata.
        metadata: Metadata,
    },
    /// The request was cancelled by a force or a reset.
    Aborted,
    /// The request failed and the error handler swallowed the failure.
    Failed {
        /// The swallowed failure.
        error: ApiError,
    },
    /// A reset settled.
    Reset,
}

impl Report {
    /// Status name of the report.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Cache { .. } => "cache",
            Self::Aborted => "aborted",
            Self::Failed { .. } => "failed",
            Self::Reset => "reset",
        }
    }

    /// Whether the request settled with a response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the request was cancelled.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// In-flight slot of one endpoint.
struct InFlight {
    id: u64,
    token: CancelToken,
}

type InFlightRegistry = Arc<Mutex<HashMap<String, InFlight>>>;

/// Removes an endpoint's registry entry when its request settles,
/// whichever way it settles. A forced replacement installs its own entry
/// under the same endpoint; the guard only evicts the entry it installed.
struct InFlightGuard {
    registry: InFlightRegistry,
    endpoint: String,
    id: u64,
}

impl InFlightGuard {
    fn register(
        registry: &InFlightRegistry,
        endpoint: &str,
        id: u64,
        token: CancelToken,
    ) -> Self {
        registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint.to_owned(), InFlight { id, token });
        Self {
            registry: Arc::clone(registry),
            endpoint: endpoint.to_owned(),
            id,
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if registry
            .get(&self.endpoint)
            .is_some_and(|entry| entry.id == self.id)
        {
            registry.remove(&self.endpoint);
        }
    }
}

/// Orchestrates fetches for every endpoint of one facade.
pub(crate) struct Controller {
    namespace: String,
    root_path: RootPath,
    error_handler: ErrorHandler,
    adapter: TransportAdapter,
    clock: Arc<dyn Clock>,
    events: HashMap<String, EndpointEvents>,
    cache_windows: HashMap<String, Option<Duration>>,
    in_flight: InFlightRegistry,
    next_request_id: AtomicU64,
}

impl Controller {
    pub(crate) fn new(
        namespace: String,
        root_path: RootPath,
        error_handler: ErrorHandler,
        adapter: TransportAdapter,
        clock: Arc<dyn Clock>,
        events: HashMap<String, EndpointEvents>,
        cache_windows: HashMap<String, Option<Duration>>,
    ) -> Self {
        Self {
            namespace,
            root_path,
            error_handler,
            adapter,
            clock,
            events,
            cache_windows,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_request_id: AtomicU64::new(0),
        }
    }

    /// Whether an endpoint currently occupies its in-flight slot.
    pub(crate) fn in_flight(&self, endpoint: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(endpoint)
    }

    /// Run one request through the lifecycle.
    #[tracing::instrument(
        name = "api_execute",
        skip_all,
        fields(endpoint = %endpoint, verb = %verb, force = force)
    )]
    pub(crate) async fn execute(
        &self,
        store: &dyn HostStore,
        endpoint: &str,
        route: &RouteTemplate,
        path_parameters: Params,
        verb: Verb,
        payload: Option<Params>,
        force: bool,
    ) -> Result<Report, ApiError> {
        let events = self
            .events
            .get(endpoint)
            .ok_or_else(|| ApiError::UnknownEndpoint(endpoint.to_owned()))?;

        // Effective URL: expanded path plus, for GET, the payload as a
        // query string. `parameters` is the request identity reported in
        // events and compared against the cache: path ∪ query for GET,
        // path only otherwise.
        let root = self.root_path.resolve();
        let path = strip_trailing_slashes(&format!(
            "{}{}",
            root.trim_end_matches('/'),
            route.expand(&path_parameters)?
        ));
        let mut parameters = path_parameters.clone();
        let url = match (&payload, verb.is_get()) {
            (Some(query), true) if !query.is_empty() => {
                parameters.extend(query.iter().map(|(key, value)| (key.clone(), value.clone())));
                format!("{path}?{}", encode_query(query)?)
            }
            _ => path,
        };

        let state = store.endpoint_state(endpoint).unwrap_or_default();
        let was_loading = state.loading;

        if was_loading {
            if force {
                self.cancel_in_flight(endpoint);
            } else {
                metrics::counter!("api.request.rejected").increment(1);
                let error = ApiError::AlreadyLoading {
                    endpoint: endpoint.to_owned(),
                };
                let context =
                    self.error_context(endpoint, &url, path_parameters, verb, payload);
                return self.settle_failure(store, error, &context);
            }
        }

        metrics::counter!("api.request.started").increment(1);
        store.dispatch(ApiEvent::fetch(
            events,
            request_metadata(&url, verb, &parameters, payload.as_ref()),
        ));

        if let Some(report) = self.cache_hit(endpoint, verb, force, was_loading, &state, &parameters)
        {
            tracing::debug!(endpoint, "cache window answered the request");
            metrics::counter!("api.request.cached").increment(1);
            store.dispatch(ApiEvent::cache(events));
            return Ok(report);
        }

        let token = CancelToken::new();
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let _guard = InFlightGuard::register(&self.in_flight, endpoint, id, token.clone());

        match self
            .adapter
            .send(&url, verb, payload.as_ref(), &token)
            .await
        {
            Ok(FetchOutcome::Response(result)) => {
                let (objects, metadata, raw) = split_result(result);
                store.dispatch(ApiEvent::success(
                    events,
                    objects.clone(),
                    metadata.clone(),
                    verb,
                    parameters,
                    path_parameters.is_empty(),
                    self.clock.now(),
                ));
                metrics::counter!("api.request.success").increment(1);
                Ok(Report::Success {
                    objects,
                    metadata,
                    raw,
                })
            }
            Ok(FetchOutcome::Aborted) => {
                tracing::debug!(endpoint, "request aborted");
                metrics::counter!("api.request.aborted").increment(1);
                store.dispatch(ApiEvent::abort(events));
                Ok(Report::Aborted)
            }
            Err(error) => {
                tracing::warn!(endpoint, %error, "request failed");
                metrics::counter!("api.request.failed").increment(1);
                store.dispatch(ApiEvent::error(events, error.to_string()));
                let context =
                    self.error_context(endpoint, &url, path_parameters, verb, payload);
                self.settle_failure(store, error, &context)
            }
        }
    }

    /// Cancel any in-flight request, then restore the initial state.
    pub(crate) fn reset(
        &self,
        store: &dyn HostStore,
        endpoint: &str,
    ) -> Result<Report, ApiError> {
        let events = self
            .events
            .get(endpoint)
            .ok_or_else(|| ApiError::UnknownEndpoint(endpoint.to_owned()))?;
        self.cancel_in_flight(endpoint);
        metrics::counter!("api.request.reset").increment(1);
        store.dispatch(ApiEvent::reset(events));
        Ok(Report::Reset)
    }

    /// Cache short-circuit check: GET only, never forced, only when the
    /// endpoint was idle, within the window, and with the same request
    /// identity as the last successful GET (or none recorded).
    fn cache_hit(
        &self,
        endpoint: &str,
        verb: Verb,
        force: bool,
        was_loading: bool,
        state: &EndpointState,
        parameters: &Params,
    ) -> Option<Report> {
        if !verb.is_get() || force || was_loading {
            return None;
        }
        let window = (*self.cache_windows.get(endpoint)?)?;
        let last_fetch = state.last_fetch?;
        // Negative elapsed time (clock skew) falls through to a refetch.
        let elapsed = (self.clock.now() - last_fetch).to_std().ok()?;
        if elapsed >= window {
            return None;
        }
        let identical = state
            .last_fetch_parameters
            .as_ref()
            .is_none_or(|last| last == parameters);
        if !identical {
            return None;
        }
        Some(Report::Cache {
            objects: state.objects.clone(),
            metadata: state.metadata.clone(),
        })
    }

    fn cancel_in_flight(&self, endpoint: &str) {
        let registry = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = registry.get(endpoint) {
            tracing::debug!(endpoint, "cancelling in-flight request");
            entry.token.cancel();
        }
    }

    /// Route a failure through the error-handler hook: propagate when the
    /// hook says so, otherwise settle with a failed report.
    fn settle_failure(
        &self,
        store: &dyn HostStore,
        error: ApiError,
        context: &ErrorContext,
    ) -> Result<Report, ApiError> {
        if (self.error_handler)(&error, context, store) {
            Err(error)
        } else {
            Ok(Report::Failed { error })
        }
    }

    fn error_context(
        &self,
        endpoint: &str,
        url: &str,
        path_parameters: Params,
        verb: Verb,
        payload: Option<Params>,
    ) -> ErrorContext {
        ErrorContext {
            endpoint: endpoint.to_owned(),
            url: url.to_owned(),
            path_parameters,
            verb,
            payload,
            namespace: self.namespace.clone(),
        }
    }
}

/// Metadata of a fetch event: the outgoing-request description.
fn request_metadata(
    url: &str,
    verb: Verb,
    parameters: &Params,
    payload: Option<&Params>,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("url".to_owned(), Value::from(url));
    metadata.insert("verb".to_owned(), Value::from(verb.as_str()));
    metadata.insert("parameters".to_owned(), Value::Object(parameters.clone()));
    if let Some(payload) = payload {
        metadata.insert("payload".to_owned(), Value::Object(payload.clone()));
    }
    metadata
}

/// Split a normalized response into the object list, the remaining
/// metadata, and (for non-JSON bodies) the raw bytes.
fn split_result(result: NormalizedResult) -> (Option<Vec<Value>>, Metadata, Option<Vec<u8>>) {
    match result {
        NormalizedResult::Json(mut metadata) => {
            let objects = match metadata.remove("objects") {
                Some(Value::Array(items)) => Some(items),
                Some(other) => {
                    // A non-array `objects` field is metadata, not a
                    // collection; the merge step is skipped.
                    metadata.insert("objects".to_owned(), other);
                    None
                }
                None => None,
            };
            (objects, metadata, None)
        }
        NormalizedResult::Raw {
            code,
            content_type,
            body,
        } => {
            let mut metadata = Metadata::new();
            metadata.insert("code".to_owned(), Value::from(code));
            if let Some(content_type) = content_type {
                metadata.insert("content_type".to_owned(), Value::from(content_type));
            }
            (None, metadata, Some(body))
        }
    }
}
