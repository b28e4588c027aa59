//! In-memory host store applying a facade's reducers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use unrest_client::{Api, HostStore};
use unrest_core::event::ApiEvent;
use unrest_core::reducer::EndpointReducer;
use unrest_core::state::EndpointState;

/// Host store for tests: holds one [`EndpointState`] per endpoint, runs
/// every reducer on each dispatched event (the combine-reducers shape a
/// real host would use) and records the event log in dispatch order.
pub struct TestStore {
    reducers: HashMap<String, EndpointReducer>,
    state: Mutex<HashMap<String, EndpointState>>,
    log: Mutex<Vec<ApiEvent>>,
}

impl TestStore {
    /// Store wired to a facade's reducers, every endpoint at its initial
    /// state.
    #[must_use]
    pub fn new(api: &Api) -> Self {
        let reducers = api.reducers().clone();
        let state = reducers
            .keys()
            .map(|endpoint| (endpoint.clone(), EndpointState::initial()))
            .collect();
        Self {
            reducers,
            state: Mutex::new(state),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of one endpoint's state (initial if unknown).
    pub fn state_of(&self, endpoint: &str) -> EndpointState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Every event dispatched so far, in order.
    pub fn event_log(&self) -> Vec<ApiEvent> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identifiers of every event dispatched so far, in order.
    pub fn event_kinds(&self) -> Vec<String> {
        self.event_log().into_iter().map(|event| event.kind).collect()
    }
}

impl HostStore for TestStore {
    fn dispatch(&self, event: ApiEvent) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            for (endpoint, reducer) in &self.reducers {
                let current = state.get(endpoint).cloned().unwrap_or_default();
                let next = reducer.reduce(&current, &event);
                state.insert(endpoint.clone(), next);
            }
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn endpoint_state(&self, endpoint: &str) -> Option<EndpointState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .cloned()
    }
}
