//! Route entity and builder
//!
//! A [`Route`] is one declared endpoint. Declaration code never holds a
//! `Route` directly: the registry hands back a [`RouteRef`], a shared handle
//! the declaring code (and the grouping facade) keep configuring after the
//! route has been registered. When the registry finalizes its tables each
//! handle is frozen into an immutable `Arc<Route>` snapshot.

use crate::handler::{BindParameters, Handler};
use crate::{Error, HttpMethod, HttpRequest, HttpResponse};
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value;
use std::sync::Arc;

/// Origin group used for routes declared outside any route file.
pub const DEFAULT_ORIGIN_GROUP: &str = "default";

/// Strip leading and trailing slashes and backslashes.
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches(|c| c == '/' || c == '\\')
}

/// What a route runs when called.
#[derive(Debug, Clone)]
pub enum Action {
    /// A method on the route's controller, looked up by name.
    Method(String),
    /// A handler value.
    Handler(Handler),
}

/// Action as written in a route declaration.
///
/// A controller/method list must have exactly two entries; any other length
/// is rejected by [`Route::create`].
#[derive(Debug, Clone)]
pub enum ActionSpec {
    Pair(Vec<String>),
    Method(String),
    Handler(Handler),
}

impl From<Handler> for ActionSpec {
    fn from(handler: Handler) -> Self {
        ActionSpec::Handler(handler)
    }
}

impl From<&str> for ActionSpec {
    fn from(method: &str) -> Self {
        ActionSpec::Method(method.to_string())
    }
}

impl From<String> for ActionSpec {
    fn from(method: String) -> Self {
        ActionSpec::Method(method)
    }
}

impl<const N: usize> From<[&str; N]> for ActionSpec {
    fn from(parts: [&str; N]) -> Self {
        ActionSpec::Pair(parts.iter().map(|p| p.to_string()).collect())
    }
}

impl From<Vec<&str>> for ActionSpec {
    fn from(parts: Vec<&str>) -> Self {
        ActionSpec::Pair(parts.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for ActionSpec {
    fn from(parts: Vec<String>) -> Self {
        ActionSpec::Pair(parts)
    }
}

/// Middleware names, kept in order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiddlewareList(Vec<String>);

impl MiddlewareList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for MiddlewareList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        MiddlewareList(names)
    }
}

impl From<&str> for MiddlewareList {
    fn from(name: &str) -> Self {
        std::iter::once(name).collect()
    }
}

impl From<String> for MiddlewareList {
    fn from(name: String) -> Self {
        std::iter::once(name).collect()
    }
}

impl From<Vec<&str>> for MiddlewareList {
    fn from(names: Vec<&str>) -> Self {
        names.into_iter().collect()
    }
}

impl From<Vec<String>> for MiddlewareList {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl<const N: usize> From<[&str; N]> for MiddlewareList {
    fn from(names: [&str; N]) -> Self {
        names.into_iter().collect()
    }
}

/// One declared route.
#[derive(Debug, Clone)]
pub struct Route {
    http_method: HttpMethod,
    pattern: String,
    prefix: Option<String>,
    name: Option<String>,
    controller: Option<String>,
    action: Action,
    middleware: Option<MiddlewareList>,
    query_parameters: Option<Vec<String>>,
    bind_parameters: BindParameters,
    is_fallback: bool,
    origin_group: String,
    resolved: Option<Handler>,
}

impl Route {
    /// Create a route.
    ///
    /// A two-entry controller/method list sets both the controller and the
    /// method; a bare string names a method on a controller supplied later
    /// (usually by a controller group); a handler is called directly.
    pub fn create(
        http_method: HttpMethod,
        pattern: &str,
        action: impl Into<ActionSpec>,
        is_fallback: bool,
    ) -> Result<Self, Error> {
        let pattern = trim_slashes(pattern).to_string();

        let (controller, action) = match action.into() {
            ActionSpec::Pair(parts) => {
                if parts.len() != 2 {
                    return Err(Error::InvalidArgumentArity {
                        route: pattern,
                        count: parts.len(),
                    });
                }
                let mut parts = parts.into_iter();
                let controller = parts.next();
                let method = parts.next().unwrap_or_default();
                (controller, Action::Method(method))
            }
            ActionSpec::Method(method) => (None, Action::Method(method)),
            ActionSpec::Handler(handler) => (None, Action::Handler(handler)),
        };

        Ok(Self {
            http_method,
            pattern,
            prefix: None,
            name: None,
            controller,
            action,
            middleware: None,
            query_parameters: None,
            bind_parameters: BindParameters::new(),
            is_fallback,
            origin_group: DEFAULT_ORIGIN_GROUP.to_string(),
            resolved: None,
        })
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn prefix(&mut self, prefix: &str) -> &mut Self {
        self.prefix = Some(trim_slashes(prefix).to_string());
        self
    }

    pub fn controller(&mut self, controller: impl Into<String>) -> &mut Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn method(&mut self, method: impl Into<String>) -> &mut Self {
        self.action = Action::Method(method.into());
        self
    }

    /// Replace the route's middleware.
    pub fn middleware(&mut self, middleware: impl Into<MiddlewareList>) -> &mut Self {
        self.middleware = Some(middleware.into());
        self
    }

    /// Restrict the query parameters visible to the handler's request.
    pub fn query_parameters<I, S>(&mut self, parameters: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_parameters = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_bind_parameters<I, K, V>(&mut self, parameters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.bind_parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn set_origin_group(&mut self, group: impl Into<String>) -> &mut Self {
        self.origin_group = group.into();
        self
    }

    pub(crate) fn set_resolved(&mut self, handler: Option<Handler>) {
        self.resolved = handler;
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// The pattern as declared, without any prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn get_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn get_middleware(&self) -> Option<&[String]> {
        self.middleware.as_ref().map(MiddlewareList::as_slice)
    }

    pub fn get_query_parameters(&self) -> Option<&[String]> {
        self.query_parameters.as_deref()
    }

    pub fn bind_parameters(&self) -> &BindParameters {
        &self.bind_parameters
    }

    pub fn origin_group(&self) -> &str {
        &self.origin_group
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// `prefix/pattern` when a prefix is set, else the pattern.
    pub fn prefixed_route(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, self.pattern),
            None => self.pattern.clone(),
        }
    }

    /// The handler this route dispatches to.
    pub fn handler(&self) -> Result<&Handler, Error> {
        match &self.action {
            Action::Handler(handler) => Ok(handler),
            Action::Method(method) => self.resolved.as_ref().ok_or_else(|| {
                Error::UnresolvedAction(format!(
                    "{}::{} for route {}",
                    self.controller.as_deref().unwrap_or("<no controller>"),
                    method,
                    self.pattern
                ))
            }),
        }
    }

    /// Dispatch to the route's handler.
    ///
    /// Every parameter declared as `HttpRequest` receives its own copy of
    /// `request`, limited to the whitelisted query parameters when the route
    /// has a whitelist. Other parameters are filled from the bound
    /// parameters by name.
    pub async fn call(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let handler = self.handler()?;

        let args = match &self.query_parameters {
            Some(allowed) => {
                let mut scoped = request.clone();
                scoped.retain_query(allowed);
                handler.bind(&self.bind_parameters, &scoped)
            }
            None => handler.bind(&self.bind_parameters, request),
        };

        handler.invoke(args).await
    }
}

/// Shared handle to a registered route.
///
/// Builder methods take `&self` and return `&Self` so declarations can chain
/// after registration:
///
/// ```
/// use waypost_core::RouterService;
///
/// let router = RouterService::new();
/// router.get("/", "index").unwrap().name("home").middleware("web");
/// ```
#[derive(Debug, Clone)]
pub struct RouteRef {
    inner: Arc<RwLock<Route>>,
}

impl RouteRef {
    pub fn new(route: Route) -> Self {
        Self {
            inner: Arc::new(RwLock::new(route)),
        }
    }

    pub fn name(&self, name: impl Into<String>) -> &Self {
        self.inner.write().name(name);
        self
    }

    pub fn prefix(&self, prefix: &str) -> &Self {
        self.inner.write().prefix(prefix);
        self
    }

    pub fn controller(&self, controller: impl Into<String>) -> &Self {
        self.inner.write().controller(controller);
        self
    }

    pub fn method(&self, method: impl Into<String>) -> &Self {
        self.inner.write().method(method);
        self
    }

    pub fn middleware(&self, middleware: impl Into<MiddlewareList>) -> &Self {
        self.inner.write().middleware(middleware);
        self
    }

    pub fn query_parameters<I, S>(&self, parameters: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.write().query_parameters(parameters);
        self
    }

    pub fn set_bind_parameters<I, K, V>(&self, parameters: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.inner.write().set_bind_parameters(parameters);
        self
    }

    /// Read access to the route as currently configured.
    pub fn read(&self) -> RwLockReadGuard<'_, Route> {
        self.inner.read()
    }

    /// A copy of the route as currently configured.
    pub fn snapshot(&self) -> Route {
        self.inner.read().clone()
    }

    pub fn ptr_eq(&self, other: &RouteRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
