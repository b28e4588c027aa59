//! # unrest-core
//!
//! Pure building blocks for the unrest data-fetching layer.
//!
//! This crate holds everything that needs no I/O: the endpoint state held
//! in the hosting store, lifecycle events and their namespaced
//! identifiers, the verb-specific object merge engine, the per-endpoint
//! reducer, URL templates, and the error taxonomy. The imperative shell
//! (transport, cancellation, the request lifecycle controller and the
//! facade) lives in `unrest-client`.
//!
//! ## The update protocol
//!
//! Every request walks the same path: a `FETCH` event raises `loading`,
//! then exactly one of `SUCCESS`, `ERROR`, `ABORT` or `CACHE` settles it,
//! and a `RESET` may restore the initial state at any later point. On
//! success, the merge engine reconciles the response's `objects` into the
//! local collection using the verb's rule and the backend-reported
//! primary keys.

/// Injected environment traits (clock).
pub mod environment;

/// Error taxonomy.
pub mod error;

/// Lifecycle events and the per-endpoint event namer.
pub mod event;

/// Verb-specific object reconciliation.
pub mod merge;

/// Per-endpoint pure reducer.
pub mod reducer;

/// URL templates and query-string encoding.
pub mod route;

/// Endpoint state and JSON map aliases.
pub mod state;

/// HTTP verbs.
pub mod verb;

pub use environment::{Clock, SystemClock};
pub use error::ApiError;
pub use event::{ApiEvent, EndpointEvents, EventBody, EventKind};
pub use merge::merge_objects;
pub use reducer::EndpointReducer;
pub use route::RouteTemplate;
pub use state::{EndpointState, Metadata, Params};
pub use verb::Verb;
