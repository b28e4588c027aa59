//! HTTP verbs understood by the data-fetching layer.

use serde::{Deserialize, Serialize};

/// HTTP verb of a request.
///
/// The merge engine gives every verb its own reconciliation rule, so the
/// verb travels with each lifecycle event rather than being forgotten at
/// dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    /// Read the collection (or one item). Payload acts as query parameters.
    Get,
    /// Replace one item, or the whole collection when batch-scoped.
    Put,
    /// Create records.
    Post,
    /// Update the changed records.
    Patch,
    /// Remove records.
    Delete,
}

impl Verb {
    /// All verbs, in the order action surfaces are generated.
    pub const ALL: [Self; 5] = [Self::Get, Self::Put, Self::Post, Self::Patch, Self::Delete];

    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// GET payloads are serialized into the query string, not a body.
    #[must_use]
    pub const fn is_get(self) -> bool {
        matches!(self, Self::Get)
    }

    /// Whether a payload is sent as a JSON request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        !self.is_get()
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
