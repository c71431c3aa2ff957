// Default route discovery over the finalized route table

use crate::logging::trace;
use crate::matcher::RouteDiscovery;
use crate::registry::RouterService;
use crate::route::{trim_slashes, Route};
use crate::{Error, HttpMethod, HttpRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Matches requests against the router's prefixed table with one `matchit`
/// router per HTTP method.
///
/// Captured path segments (`users/{id}`) are bound to the matched route by
/// name, as strings, alongside the route's declared bound parameters.
/// Requests that match nothing get the fallback route, if one is declared.
pub struct TableDiscovery {
    methods: HashMap<HttpMethod, matchit::Router<Arc<Route>>>,
    fallback: Option<Arc<Route>>,
}

impl TableDiscovery {
    /// Build from a router, finalizing it if needed.
    pub fn new(router: &RouterService) -> Result<Self, Error> {
        let table = router.routes()?;
        let mut methods: HashMap<HttpMethod, matchit::Router<Arc<Route>>> = HashMap::new();

        for (method, pattern, route) in table.iter() {
            let path = format!("/{}", trim_slashes(pattern));
            methods
                .entry(method)
                .or_insert_with(matchit::Router::new)
                .insert(path.as_str(), Arc::clone(route))
                .map_err(|e| Error::Discovery(format!("{} {}: {}", method, path, e)))?;
        }

        Ok(Self {
            methods,
            fallback: router.fallback_route(),
        })
    }

    fn fallback(&self) -> Option<Route> {
        self.fallback.as_deref().cloned()
    }
}

impl RouteDiscovery for TableDiscovery {
    fn discover(&self, request: &HttpRequest) -> Result<Option<Route>, Error> {
        let Some(method) = request.http_method() else {
            return Ok(self.fallback());
        };

        let path = format!("/{}", trim_slashes(&request.path));
        let matched = self
            .methods
            .get(&method)
            .and_then(|router| router.at(&path).ok());

        let Some(matched) = matched else {
            trace!(%method, path = %path, "No route matched");
            return Ok(self.fallback());
        };

        let mut route = matched.value.as_ref().clone();
        // Captures join the declared bound parameters and win on a name clash.
        let mut bound = route.bind_parameters().clone();
        bound.extend(
            matched
                .params
                .iter()
                .map(|(name, value)| (name.to_string(), Value::String(value.to_string()))),
        );
        route.set_bind_parameters(bound);

        trace!(%method, path = %path, pattern = route.pattern(), "Route matched");
        Ok(Some(route))
    }
}
