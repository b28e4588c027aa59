//! Lifecycle events and the per-endpoint event namer.
//!
//! Each endpoint owns six stable identifiers of the shape
//! `@@unrest/<prefix>/<endpoint>/<ACTION>`; reducers match on the
//! identifier so events from other endpoints (or other facades mounted in
//! the same store) fall through untouched.

use crate::state::{Metadata, Params};
use crate::verb::Verb;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace segment shared by every event identifier.
pub const EVENT_NAMESPACE: &str = "@@unrest";

/// The six lifecycle transitions of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A request was issued.
    Fetch,
    /// A response settled successfully.
    Success,
    /// A response settled with a failure.
    Error,
    /// The request was cancelled.
    Abort,
    /// The cache window answered instead of the network.
    Cache,
    /// Endpoint state was restored to its initial value.
    Reset,
}

impl EventKind {
    /// All kinds, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Fetch,
        Self::Success,
        Self::Error,
        Self::Abort,
        Self::Cache,
        Self::Reset,
    ];

    /// Identifier suffix (`FETCH`, `SUCCESS`, ...).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Fetch => "FETCH",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Abort => "ABORT",
            Self::Cache => "CACHE",
            Self::Reset => "RESET",
        }
    }
}

/// Event identifiers of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEvents {
    /// Request issued.
    pub fetch: String,
    /// Response settled successfully.
    pub success: String,
    /// Response settled with a failure.
    pub error: String,
    /// Request cancelled.
    pub abort: String,
    /// Cache window short-circuited the request.
    pub cache: String,
    /// State restored to its initial value.
    pub reset: String,
}

impl EndpointEvents {
    /// Derive the identifiers for `endpoint` under `prefix`.
    #[must_use]
    pub fn new(prefix: &str, endpoint: &str) -> Self {
        let base = format!("{EVENT_NAMESPACE}/{prefix}/{endpoint}");
        Self {
            fetch: format!("{base}/FETCH"),
            success: format!("{base}/SUCCESS"),
            error: format!("{base}/ERROR"),
            abort: format!("{base}/ABORT"),
            cache: format!("{base}/CACHE"),
            reset: format!("{base}/RESET"),
        }
    }

    /// Identifier for a kind.
    #[must_use]
    pub fn identifier(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Fetch => &self.fetch,
            EventKind::Success => &self.success,
            EventKind::Error => &self.error,
            EventKind::Abort => &self.abort,
            EventKind::Cache => &self.cache,
            EventKind::Reset => &self.reset,
        }
    }

    /// Map an identifier back to its kind; `None` for identifiers that
    /// belong to another endpoint or another system entirely.
    #[must_use]
    pub fn kind_of(&self, identifier: &str) -> Option<EventKind> {
        EventKind::ALL
            .into_iter()
            .find(|kind| self.identifier(*kind) == identifier)
    }
}

/// One lifecycle event, addressed by its endpoint-scoped identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEvent {
    /// Full event identifier, e.g. `@@unrest/api/color/FETCH`.
    pub kind: String,
    /// Payload of the transition.
    pub body: EventBody,
}

/// Payload carried by each lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventBody {
    /// Request issued; `metadata` describes the outgoing request
    /// (`url`, `verb`, `parameters`, `payload`).
    Fetch {
        /// Outgoing-request description.
        metadata: Metadata,
    },
    /// Response received and classified as a success.
    Success {
        /// Object list from the response, absent for acknowledgement-style
        /// bodies (the merge step is skipped then).
        objects: Option<Vec<Value>>,
        /// Remaining response fields.
        metadata: Metadata,
        /// Verb of the settled request.
        verb: Verb,
        /// Path + query parameters the request was issued with.
        parameters: Params,
        /// Whether the request targeted the collection rather than an item.
        is_batch: bool,
        /// Settle time, stamped by the controller's clock.
        received_at: DateTime<Utc>,
    },
    /// Response settled with a failure.
    Error {
        /// Display form of the failure.
        error: String,
    },
    /// Request cancelled by a force or a reset.
    Abort,
    /// Cache window answered instead of the network.
    Cache,
    /// State restored to its initial value.
    Reset,
}

impl ApiEvent {
    /// Fetch event for an endpoint.
    #[must_use]
    pub fn fetch(events: &EndpointEvents, metadata: Metadata) -> Self {
        Self {
            kind: events.fetch.clone(),
            body: EventBody::Fetch { metadata },
        }
    }

    /// Success event for an endpoint.
    #[must_use]
    pub fn success(
        events: &EndpointEvents,
        objects: Option<Vec<Value>>,
        metadata: Metadata,
        verb: Verb,
        parameters: Params,
        is_batch: bool,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: events.success.clone(),
            body: EventBody::Success {
                objects,
                metadata,
                verb,
                parameters,
                is_batch,
                received_at,
            },
        }
    }

    /// Error event for an endpoint.
    #[must_use]
    pub fn error(events: &EndpointEvents, error: String) -> Self {
        Self {
            kind: events.error.clone(),
            body: EventBody::Error { error },
        }
    }

    /// Abort event for an endpoint.
    #[must_use]
    pub fn abort(events: &EndpointEvents) -> Self {
        Self {
            kind: events.abort.clone(),
            body: EventBody::Abort,
        }
    }

    /// Cache event for an endpoint.
    #[must_use]
    pub fn cache(events: &EndpointEvents) -> Self {
        Self {
            kind: events.cache.clone(),
            body: EventBody::Cache,
        }
    }

    /// Reset event for an endpoint.
    #[must_use]
    pub fn reset(events: &EndpointEvents) -> Self {
        Self {
            kind: events.reset.clone(),
            body: EventBody::Reset,
        }
    }
}
