//! Request-time route matching
//!
//! A [`RouteMatch`] lives for one request. It asks a [`RouteDiscovery`] for
//! the route once and hands out the cached answer afterwards.

use crate::logging::debug;
use crate::route::Route;
use crate::{Error, HttpRequest, HttpResponse};
use once_cell::sync::OnceCell;

/// Picks the route serving a request.
pub trait RouteDiscovery: Send + Sync {
    /// The route for `request`, or `None` when nothing (not even a fallback)
    /// serves it.
    fn discover(&self, request: &HttpRequest) -> Result<Option<Route>, Error>;
}

/// Per-request match state.
///
/// `RouteMatch` is `Sync` whenever its discovery is, so a `dispatch` future
/// can be spawned on a multi-threaded runtime.
///
/// ```
/// use waypost_core::{HttpRequest, RouteMatch, RouterService, TableDiscovery};
///
/// let router = RouterService::new();
/// router.get("users/{id}", "show").unwrap();
/// let discovery = TableDiscovery::new(&router).unwrap();
///
/// let matched = RouteMatch::new(&discovery, HttpRequest::new("GET", "/users/7"));
/// let route = matched.get_match_route().unwrap().unwrap();
/// assert_eq!(route.pattern(), "users/{id}");
/// ```
pub struct RouteMatch<'a, D: RouteDiscovery + ?Sized> {
    discovery: &'a D,
    request: HttpRequest,
    route: OnceCell<Option<Route>>,
}

impl<'a, D: RouteDiscovery + ?Sized> RouteMatch<'a, D> {
    pub fn new(discovery: &'a D, request: HttpRequest) -> Self {
        Self {
            discovery,
            request,
            route: OnceCell::new(),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Run discovery for this request, bypassing the cache.
    pub fn discover(&self) -> Result<Option<Route>, Error> {
        self.discovery.discover(&self.request)
    }

    /// The matched route. Discovery runs on the first call only; a failed
    /// discovery is not cached.
    pub fn get_match_route(&self) -> Result<Option<&Route>, Error> {
        self.route
            .get_or_try_init(|| self.discover())
            .map(Option::as_ref)
    }

    /// Call the matched route with this request.
    pub async fn dispatch(&self) -> Result<HttpResponse, Error> {
        let route = self.get_match_route()?.ok_or_else(|| {
            debug!(method = %self.request.method, path = %self.request.path, "No route for request");
            Error::NotFound(self.request.path.clone())
        })?;
        route.call(&self.request).await
    }
}
