//! Per-endpoint reducer consuming lifecycle events.

use crate::event::{ApiEvent, EndpointEvents, EventBody, EventKind};
use crate::merge::merge_objects;
use crate::state::{EndpointState, primary_keys_of};

/// Pure state reducer for one endpoint.
///
/// `reduce` is a pure transition `(state, event) -> state`: events that
/// belong to another endpoint, or carry a body that does not match their
/// identifier, return the state unchanged. The success transition takes
/// its timestamp from the event (`received_at`), so reducing the same
/// event twice over the same state yields the same result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReducer {
    events: EndpointEvents,
}

impl EndpointReducer {
    /// Build the reducer for one endpoint's event identifiers.
    #[must_use]
    pub const fn new(events: EndpointEvents) -> Self {
        Self { events }
    }

    /// The event identifiers this reducer answers to.
    #[must_use]
    pub const fn events(&self) -> &EndpointEvents {
        &self.events
    }

    /// Apply one event to the endpoint state.
    #[must_use]
    pub fn reduce(&self, state: &EndpointState, event: &ApiEvent) -> EndpointState {
        let Some(kind) = self.events.kind_of(&event.kind) else {
            return state.clone();
        };
        match (kind, &event.body) {
            (EventKind::Fetch, EventBody::Fetch { metadata }) => EndpointState {
                loading: true,
                error: None,
                metadata: metadata.clone(),
                ..state.clone()
            },
            (
                EventKind::Success,
                EventBody::Success {
                    objects,
                    metadata,
                    verb,
                    parameters,
                    is_batch,
                    received_at,
                },
            ) => {
                // An acknowledgement without an object list leaves the
                // collection untouched.
                let merged = objects.as_ref().map_or_else(
                    || state.objects.clone(),
                    |new| {
                        merge_objects(
                            *verb,
                            &state.objects,
                            new,
                            &primary_keys_of(metadata),
                            *is_batch,
                        )
                    },
                );
                EndpointState {
                    objects: merged,
                    metadata: metadata.clone(),
                    loading: false,
                    error: None,
                    last_fetch: if verb.is_get() {
                        Some(*received_at)
                    } else {
                        state.last_fetch
                    },
                    last_fetch_parameters: if verb.is_get() {
                        Some(parameters.clone())
                    } else {
                        state.last_fetch_parameters.clone()
                    },
                }
            }
            (EventKind::Error, EventBody::Error { error }) => EndpointState {
                loading: false,
                error: Some(error.clone()),
                ..state.clone()
            },
            (EventKind::Abort, EventBody::Abort) => EndpointState {
                loading: false,
                error: None,
                ..state.clone()
            },
            (EventKind::Cache, EventBody::Cache) => EndpointState {
                loading: false,
                ..state.clone()
            },
            (EventKind::Reset, EventBody::Reset) => EndpointState::initial(),
            _ => state.clone(),
        }
    }
}
