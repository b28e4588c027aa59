//! Facade configuration and the route map.

use crate::credentials::CredentialStore;
use crate::store::HostStore;
use crate::transport::HttpTransport;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use unrest_core::environment::{Clock, SystemClock};
use unrest_core::error::ApiError;
use unrest_core::state::Params;
use unrest_core::verb::Verb;

/// Context handed to the error-handler hook alongside the failure.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Endpoint the failing request belonged to.
    pub endpoint: String,
    /// Effective request URL.
    pub url: String,
    /// Path parameters of the call.
    pub path_parameters: Params,
    /// Verb of the call.
    pub verb: Verb,
    /// Payload of the call, if any.
    pub payload: Option<Params>,
    /// Event namespace segment of the owning facade.
    pub namespace: String,
}

/// Error-handler hook.
///
/// Invoked with every network or already-loading failure, the request
/// context and the host store. Return `true` to propagate the failure to
/// the caller, `false` to swallow it into a failed report. Either way the
/// error event has already been dispatched, so UI layers can render the
/// failure even when it is swallowed.
pub type ErrorHandler = Arc<dyn Fn(&ApiError, &ErrorContext, &dyn HostStore) -> bool + Send + Sync>;

/// URL prefix, fixed or recomputed per request.
#[derive(Clone)]
pub enum RootPath {
    /// Fixed prefix.
    Static(String),
    /// Prefix recomputed on every request.
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl RootPath {
    pub(crate) fn resolve(&self) -> String {
        match self {
            Self::Static(path) => path.clone(),
            Self::Dynamic(compute) => compute(),
        }
    }
}

impl fmt::Debug for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => f.debug_tuple("Static").field(path).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl Default for RootPath {
    fn default() -> Self {
        Self::Static(String::new())
    }
}

impl From<&str> for RootPath {
    fn from(path: &str) -> Self {
        Self::Static(path.to_owned())
    }
}

impl From<String> for RootPath {
    fn from(path: String) -> Self {
        Self::Static(path)
    }
}

/// Credential-store selection.
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credential handling.
    #[default]
    Disabled,
    /// Probe for the process-wide default store at construction time.
    PlatformDefault,
    /// Use the given store.
    Custom(Arc<dyn CredentialStore>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::PlatformDefault => f.write_str("PlatformDefault"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Facade configuration.
///
/// Defaults: prefix `api`, empty root path, no cache window, credentials
/// disabled, an error handler that propagates everything, the reqwest
/// transport, and the system clock.
///
/// # Example
///
/// ```ignore
/// let config = ApiConfig::new()
///     .with_prefix("api")
///     .with_root_path("/api/v1")
///     .with_cache(Duration::from_millis(500));
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    pub(crate) prefix: String,
    pub(crate) root_path: RootPath,
    pub(crate) cache: Option<Duration>,
    pub(crate) credentials: Credentials,
    pub(crate) error_handler: ErrorHandler,
    pub(crate) transport: Option<Arc<dyn HttpTransport>>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ApiConfig {
    /// Configuration with the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: "api".to_owned(),
            root_path: RootPath::default(),
            cache: None,
            credentials: Credentials::Disabled,
            error_handler: Arc::new(|_, _, _| true),
            transport: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the event namespace segment.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_owned();
        self
    }

    /// Set the URL prefix.
    #[must_use]
    pub fn with_root_path(mut self, root_path: impl Into<RootPath>) -> Self {
        self.root_path = root_path.into();
        self
    }

    /// Enable the GET response cache with the given window.
    #[must_use]
    pub const fn with_cache(mut self, window: Duration) -> Self {
        self.cache = Some(window);
        self
    }

    /// Select the credential store.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Install the error-handler hook.
    #[must_use]
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&ApiError, &ErrorContext, &dyn HostStore) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Inject the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("prefix", &self.prefix)
            .field("root_path", &self.root_path)
            .field("cache", &self.cache)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// One route declaration: a URL template plus per-endpoint overrides.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) url: String,
    pub(crate) cache: Option<Option<Duration>>,
}

impl Route {
    /// Route for a URL template.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            cache: None,
        }
    }

    /// Override the facade-wide cache window for this endpoint; `None`
    /// disables caching for it.
    #[must_use]
    pub const fn with_cache(mut self, window: Option<Duration>) -> Self {
        self.cache = Some(window);
        self
    }
}

impl From<&str> for Route {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Ordered endpoint-name → route map.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    pub(crate) entries: Vec<(String, Route)>,
}

impl Routes {
    /// Empty route map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an endpoint. Names must be unique within one facade;
    /// duplicates are rejected when the facade is built.
    #[must_use]
    pub fn route(mut self, endpoint: &str, route: impl Into<Route>) -> Self {
        self.entries.push((endpoint.to_owned(), route.into()));
        self
    }
}
