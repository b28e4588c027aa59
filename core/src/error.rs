//! Error taxonomy for the data-fetching layer.
//!
//! Every failure is a tagged [`ApiError`] variant with structured fields;
//! the legacy name/code/description surface is exposed through accessors
//! instead of mutating a generic error object. An aborted request is not
//! an error at all; it settles as its own terminal outcome.

use crate::verb::Verb;
use thiserror::Error;

/// Result alias for fallible operations in this layer.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures a request, an action, or facade construction can produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered with a status outside `[200, 300)`.
    ///
    /// The display form is the one stored in endpoint state and asserted
    /// on by UI layers: `HttpError: [<code>] - <description>`.
    #[error("HttpError: [{code}] - {description}")]
    Http {
        /// HTTP status code.
        code: u16,
        /// Description extracted from the response body.
        description: String,
    },

    /// A non-forced request collided with an in-flight one.
    #[error("AlreadyLoadingError: endpoint {endpoint} already has a request in flight")]
    AlreadyLoading {
        /// Endpoint whose in-flight slot was occupied.
        endpoint: String,
    },

    /// An item-scoped action was called without path parameters.
    ///
    /// Synthesized synchronously, before anything is dispatched; a
    /// programmer error rather than a network failure.
    #[error("MissingParametersError: {verb} item call on {endpoint} requires path parameters")]
    MissingParameters {
        /// Endpoint the action belongs to.
        endpoint: String,
        /// Verb of the offending call.
        verb: Verb,
    },

    /// A URL template could not be parsed or expanded.
    #[error("RouteError: {0}")]
    Route(String),

    /// The transport failed before producing a classifiable response.
    #[error("TransportError: {0}")]
    Transport(String),

    /// Two routes in one facade share an endpoint name.
    #[error("DuplicateEndpointError: endpoint {0} is declared twice")]
    DuplicateEndpoint(String),

    /// A request referenced an endpoint the facade does not know.
    #[error("UnknownEndpointError: no endpoint named {0}")]
    UnknownEndpoint(String),
}

impl ApiError {
    /// Legacy error name, the part before the colon in the display form.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Http { .. } => "HttpError",
            Self::AlreadyLoading { .. } => "AlreadyLoadingError",
            Self::MissingParameters { .. } => "MissingParametersError",
            Self::Route(_) => "RouteError",
            Self::Transport(_) => "TransportError",
            Self::DuplicateEndpoint(_) => "DuplicateEndpointError",
            Self::UnknownEndpoint(_) => "UnknownEndpointError",
        }
    }

    /// HTTP status code, for transport errors that carry one.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Human-readable description without the error-name prefix.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Http { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_matches_state_format() {
        let error = ApiError::Http {
            code: 500,
            description: "This is the error".to_owned(),
        };
        assert_eq!(error.to_string(), "HttpError: [500] - This is the error");
        assert_eq!(error.name(), "HttpError");
        assert_eq!(error.code(), Some(500));
        assert_eq!(error.description(), "This is the error");
    }

    #[test]
    fn local_errors_carry_no_code() {
        let error = ApiError::AlreadyLoading {
            endpoint: "color".to_owned(),
        };
        assert_eq!(error.name(), "AlreadyLoadingError");
        assert_eq!(error.code(), None);
    }
}
