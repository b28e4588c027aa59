//! Seam to the hosting state store.

use unrest_core::event::ApiEvent;
use unrest_core::state::EndpointState;

/// The two capabilities this layer needs from the hosting store: event
/// dispatch and a snapshot of one endpoint's state.
///
/// How the endpoint slice is located inside the host's state tree is the
/// implementor's business; the client never reaches into the host state
/// itself.
pub trait HostStore: Send + Sync {
    /// Deliver a lifecycle event to the reducers.
    fn dispatch(&self, event: ApiEvent);

    /// Snapshot of one endpoint's state, or `None` before its reducer has
    /// run.
    fn endpoint_state(&self, endpoint: &str) -> Option<EndpointState>;
}
