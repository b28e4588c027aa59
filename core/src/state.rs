//! Endpoint state held in the hosting store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object map used for path parameters and query payloads.
pub type Params = Map<String, Value>;

/// Response metadata of an endpoint: everything the backend sends next to
/// `objects` (`primary_keys`, `occurences`, status code, ...).
pub type Metadata = Map<String, Value>;

/// Local cache of one endpoint.
///
/// Created with [`EndpointState::initial`] the first time its reducer
/// runs, then mutated only through lifecycle events. `loading` is true
/// strictly between fetch-issued and settle; `last_fetch` and
/// `last_fetch_parameters` move only on successful GETs, never on
/// mutating verbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointState {
    /// Records last reconciled from the server.
    pub objects: Vec<Value>,
    /// Metadata from the last lifecycle event that carried any, replaced
    /// wholesale.
    pub metadata: Metadata,
    /// Whether a request is outstanding.
    pub loading: bool,
    /// Last error description, cleared on fetch start and success.
    pub error: Option<String>,
    /// Settle time of the last successful GET.
    pub last_fetch: Option<DateTime<Utc>>,
    /// Path + query parameters of the last successful GET.
    pub last_fetch_parameters: Option<Params>,
}

impl EndpointState {
    /// Initial value, also restored by a reset.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            objects: Vec::new(),
            metadata: Metadata::new(),
            loading: false,
            error: None,
            last_fetch: None,
            last_fetch_parameters: None,
        }
    }

    /// Primary-key field names reported by the backend in
    /// `metadata["primary_keys"]`.
    #[must_use]
    pub fn primary_keys(&self) -> Vec<String> {
        primary_keys_of(&self.metadata)
    }
}

impl Default for EndpointState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Extract the `primary_keys` string array from a metadata map.
///
/// Missing or malformed entries yield an empty set; the merge engine
/// treats an empty set as "all records equal", matching the upstream
/// vacuous-truth behavior.
#[must_use]
pub fn primary_keys_of(metadata: &Metadata) -> Vec<String> {
    metadata
        .get("primary_keys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(|key| key.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
