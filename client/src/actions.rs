//! Action factory: the callable surface of one endpoint.
//!
//! Every call produces a [`Thunk`], a schedulable unit of work that runs
//! the request lifecycle against a host store when asked to. Verb
//! dispatch is a static table: one method per verb, plus the generic
//! [`EndpointActions::request`] entry the per-verb methods delegate to.

use crate::controller::{Controller, Report};
use crate::store::HostStore;
use std::sync::Arc;
use unrest_core::error::ApiError;
use unrest_core::route::RouteTemplate;
use unrest_core::state::Params;
use unrest_core::verb::Verb;

/// A schedulable unit of work.
///
/// Running a thunk performs the full request lifecycle (cache check,
/// in-flight arbitration, transport call, event dispatch) and settles
/// with a [`Report`].
#[must_use = "a thunk does nothing until run against a store"]
pub struct Thunk {
    controller: Arc<Controller>,
    endpoint: String,
    kind: ThunkKind,
}

#[derive(Debug)]
enum ThunkKind {
    Request {
        route: Arc<RouteTemplate>,
        verb: Verb,
        path_parameters: Params,
        payload: Option<Params>,
        force: bool,
    },
    Reset,
}

impl std::fmt::Debug for Thunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thunk")
            .field("endpoint", &self.endpoint)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Thunk {
    /// Run the thunk against a host store.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`] when the error-handler hook
    /// asks for propagation, and [`ApiError::Route`] for template
    /// expansion failures. Swallowed failures settle as
    /// [`Report::Failed`] instead.
    pub async fn run(self, store: &dyn HostStore) -> Result<Report, ApiError> {
        match self.kind {
            ThunkKind::Request {
                route,
                verb,
                path_parameters,
                payload,
                force,
            } => {
                self.controller
                    .execute(
                        store,
                        &self.endpoint,
                        &route,
                        path_parameters,
                        verb,
                        payload,
                        force,
                    )
                    .await
            }
            ThunkKind::Reset => self.controller.reset(store, &self.endpoint),
        }
    }
}

/// The callable surface of one endpoint: one action per verb, item-scoped
/// variants, force variants, and reset.
#[derive(Clone)]
pub struct EndpointActions {
    endpoint: String,
    route: Arc<RouteTemplate>,
    controller: Arc<Controller>,
}

impl EndpointActions {
    pub(crate) const fn new(
        endpoint: String,
        route: Arc<RouteTemplate>,
        controller: Arc<Controller>,
    ) -> Self {
        Self {
            endpoint,
            route,
            controller,
        }
    }

    /// Collection-scoped request with an explicit verb.
    pub fn request(&self, verb: Verb, payload: Option<Params>, force: bool) -> Thunk {
        self.build(verb, Params::new(), payload, force)
    }

    /// Item-scoped request with an explicit verb.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`], synchronously and before
    /// anything is dispatched, when `parameters` is empty.
    pub fn request_item(
        &self,
        verb: Verb,
        parameters: Params,
        payload: Option<Params>,
        force: bool,
    ) -> Result<Thunk, ApiError> {
        if parameters.is_empty() {
            return Err(ApiError::MissingParameters {
                endpoint: self.endpoint.clone(),
                verb,
            });
        }
        Ok(self.build(verb, parameters, payload, force))
    }

    /// GET the collection; the payload becomes the query string.
    pub fn get(&self, payload: Option<Params>) -> Thunk {
        self.request(Verb::Get, payload, false)
    }

    /// GET one item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn get_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.request_item(Verb::Get, parameters, payload, false)
    }

    /// PUT the whole collection.
    pub fn put(&self, payload: Option<Params>) -> Thunk {
        self.request(Verb::Put, payload, false)
    }

    /// PUT one item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn put_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.request_item(Verb::Put, parameters, payload, false)
    }

    /// POST to the collection.
    pub fn post(&self, payload: Option<Params>) -> Thunk {
        self.request(Verb::Post, payload, false)
    }

    /// POST to one item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn post_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.request_item(Verb::Post, parameters, payload, false)
    }

    /// PATCH the collection.
    pub fn patch(&self, payload: Option<Params>) -> Thunk {
        self.request(Verb::Patch, payload, false)
    }

    /// PATCH one item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn patch_item(
        &self,
        parameters: Params,
        payload: Option<Params>,
    ) -> Result<Thunk, ApiError> {
        self.request_item(Verb::Patch, parameters, payload, false)
    }

    /// DELETE from the collection.
    pub fn delete(&self, payload: Option<Params>) -> Thunk {
        self.request(Verb::Delete, payload, false)
    }

    /// DELETE one item.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn delete_item(
        &self,
        parameters: Params,
        payload: Option<Params>,
    ) -> Result<Thunk, ApiError> {
        self.request_item(Verb::Delete, parameters, payload, false)
    }

    /// Force variants: cancel and replace whatever is in flight.
    #[must_use]
    pub const fn force(&self) -> ForceActions<'_> {
        ForceActions { actions: self }
    }

    /// Cancel any in-flight request and restore the initial state.
    pub fn reset(&self) -> Thunk {
        Thunk {
            controller: Arc::clone(&self.controller),
            endpoint: self.endpoint.clone(),
            kind: ThunkKind::Reset,
        }
    }

    fn build(
        &self,
        verb: Verb,
        path_parameters: Params,
        payload: Option<Params>,
        force: bool,
    ) -> Thunk {
        Thunk {
            controller: Arc::clone(&self.controller),
            endpoint: self.endpoint.clone(),
            kind: ThunkKind::Request {
                route: Arc::clone(&self.route),
                verb,
                path_parameters,
                payload,
                force,
            },
        }
    }
}

/// Force-scoped view of [`EndpointActions`]: same surface, `force=true`.
pub struct ForceActions<'a> {
    actions: &'a EndpointActions,
}

impl ForceActions<'_> {
    /// Forced collection-scoped GET.
    pub fn get(&self, payload: Option<Params>) -> Thunk {
        self.actions.request(Verb::Get, payload, true)
    }

    /// Forced item-scoped GET.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn get_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.actions.request_item(Verb::Get, parameters, payload, true)
    }

    /// Forced PUT.
    pub fn put(&self, payload: Option<Params>) -> Thunk {
        self.actions.request(Verb::Put, payload, true)
    }

    /// Forced item-scoped PUT.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn put_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.actions.request_item(Verb::Put, parameters, payload, true)
    }

    /// Forced POST.
    pub fn post(&self, payload: Option<Params>) -> Thunk {
        self.actions.request(Verb::Post, payload, true)
    }

    /// Forced item-scoped POST.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn post_item(&self, parameters: Params, payload: Option<Params>) -> Result<Thunk, ApiError> {
        self.actions.request_item(Verb::Post, parameters, payload, true)
    }

    /// Forced PATCH.
    pub fn patch(&self, payload: Option<Params>) -> Thunk {
        self.actions.request(Verb::Patch, payload, true)
    }

    /// Forced item-scoped PATCH.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn patch_item(
        &self,
        parameters: Params,
        payload: Option<Params>,
    ) -> Result<Thunk, ApiError> {
        self.actions.request_item(Verb::Patch, parameters, payload, true)
    }

    /// Forced DELETE.
    pub fn delete(&self, payload: Option<Params>) -> Thunk {
        self.actions.request(Verb::Delete, payload, true)
    }

    /// Forced item-scoped DELETE.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingParameters`] when `parameters` is
    /// empty.
    pub fn delete_item(
        &self,
        parameters: Params,
        payload: Option<Params>,
    ) -> Result<Thunk, ApiError> {
        self.actions.request_item(Verb::Delete, parameters, payload, true)
    }
}
