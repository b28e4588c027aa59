//! # unrest-client
//!
//! Declarative data-fetching layer for unrest-style REST backends.
//!
//! A route map and a configuration go in; per endpoint come out stable
//! event identifiers, action thunks (one per HTTP verb, plus item-scoped,
//! force and reset variants) and a pure reducer over the endpoint's local
//! collection. The hosting store stays external: thunks run against
//! anything implementing [`HostStore`].
//!
//! ## Example
//!
//! ```ignore
//! use unrest_client::{Api, ApiConfig, Routes};
//!
//! let api = Api::new(
//!     Routes::new()
//!         .route("fruit", "fruit")
//!         .route("color", "base/color/:id?"),
//!     ApiConfig::new().with_root_path("/api/v1"),
//! )?;
//!
//! // Somewhere with a store in scope:
//! let report = api.actions("color")?.get(None).run(&store).await?;
//! ```
//!
//! Concurrency per endpoint is one-slot: a second request fails fast
//! unless forced, in which case it cancels and replaces the first. A
//! configurable cache window short-circuits repeated GETs with the same
//! parameters.

/// Action factory and thunks.
pub mod actions;

/// Cooperative cancellation token.
pub mod cancel;

/// Configuration and route map.
pub mod config;

mod controller;

/// Bearer-credential storage.
pub mod credentials;

/// Host-store seam.
pub mod store;

/// Transport contract and adapter.
pub mod transport;

pub use actions::{EndpointActions, ForceActions, Thunk};
pub use cancel::CancelToken;
pub use config::{ApiConfig, Credentials, ErrorContext, ErrorHandler, Route, RootPath, Routes};
pub use controller::Report;
pub use credentials::{CredentialStore, MemoryCredentials};
pub use store::HostStore;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

use crate::controller::Controller;
use crate::transport::TransportAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use unrest_core::error::ApiError;
use unrest_core::event::EndpointEvents;
use unrest_core::reducer::EndpointReducer;
use unrest_core::route::RouteTemplate;

/// The facade: events, actions and reducers wired from a route map.
pub struct Api {
    events: HashMap<String, EndpointEvents>,
    actions: HashMap<String, EndpointActions>,
    reducers: HashMap<String, EndpointReducer>,
    endpoints: Vec<String>,
    controller: Arc<Controller>,
}

impl Api {
    /// Build the facade from a route map and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::DuplicateEndpoint`] when two routes share a
    /// name and [`ApiError::Route`] for a malformed template, both
    /// programmer errors surfaced at construction time.
    pub fn new(routes: Routes, config: ApiConfig) -> Result<Self, ApiError> {
        let mut events = HashMap::new();
        let mut cache_windows = HashMap::new();
        let mut templates: Vec<(String, Arc<RouteTemplate>)> = Vec::new();

        for (endpoint, route) in routes.entries {
            if events.contains_key(&endpoint) {
                return Err(ApiError::DuplicateEndpoint(endpoint));
            }
            let template = Arc::new(RouteTemplate::parse(&route.url)?);
            events.insert(
                endpoint.clone(),
                EndpointEvents::new(&config.prefix, &endpoint),
            );
            cache_windows.insert(endpoint.clone(), route.cache.unwrap_or(config.cache));
            templates.push((endpoint, template));
        }

        let credentials = match &config.credentials {
            Credentials::Disabled => None,
            Credentials::PlatformDefault => credentials::platform_default(),
            Credentials::Custom(store) => Some(Arc::clone(store)),
        };
        let transport = config
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let controller = Arc::new(Controller::new(
            config.prefix,
            config.root_path,
            config.error_handler,
            TransportAdapter::new(transport, credentials),
            config.clock,
            events.clone(),
            cache_windows,
        ));

        let mut actions = HashMap::new();
        let mut endpoints = Vec::new();
        for (endpoint, template) in templates {
            actions.insert(
                endpoint.clone(),
                EndpointActions::new(endpoint.clone(), template, Arc::clone(&controller)),
            );
            endpoints.push(endpoint);
        }
        let reducers = events
            .iter()
            .map(|(endpoint, endpoint_events)| {
                (
                    endpoint.clone(),
                    EndpointReducer::new(endpoint_events.clone()),
                )
            })
            .collect();

        Ok(Self {
            events,
            actions,
            reducers,
            endpoints,
            controller,
        })
    }

    /// Event identifiers of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownEndpoint`] for names not in the route
    /// map.
    pub fn events(&self, endpoint: &str) -> Result<&EndpointEvents, ApiError> {
        self.events
            .get(endpoint)
            .ok_or_else(|| ApiError::UnknownEndpoint(endpoint.to_owned()))
    }

    /// Action surface of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownEndpoint`] for names not in the route
    /// map.
    pub fn actions(&self, endpoint: &str) -> Result<&EndpointActions, ApiError> {
        self.actions
            .get(endpoint)
            .ok_or_else(|| ApiError::UnknownEndpoint(endpoint.to_owned()))
    }

    /// Reducer of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownEndpoint`] for names not in the route
    /// map.
    pub fn reducer(&self, endpoint: &str) -> Result<&EndpointReducer, ApiError> {
        self.reducers
            .get(endpoint)
            .ok_or_else(|| ApiError::UnknownEndpoint(endpoint.to_owned()))
    }

    /// All reducers, keyed by endpoint.
    #[must_use]
    pub const fn reducers(&self) -> &HashMap<String, EndpointReducer> {
        &self.reducers
    }

    /// Endpoint names, in declaration order.
    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Whether an endpoint currently has a request in flight.
    #[must_use]
    pub fn in_flight(&self, endpoint: &str) -> bool {
        self.controller.in_flight(endpoint)
    }
}
