//! Router service: the staged route registry
//!
//! Routes move through three areas:
//!
//! ```text
//! declare ─▶ staging ─flush─▶ screening frame (one per active group)
//!                                  │ attributes applied
//!                                  ▼
//!                               routes ─finalize─▶ prefixed table (frozen)
//! ```
//!
//! A grouping call flushes whatever was staged before it, opens a screening
//! frame, runs the caller's batch, flushes the batch into the frame, applies
//! its attributes to every route in the frame and merges the frame into the
//! enclosing frame (or into `routes` at the outermost level). Nested groups
//! therefore hand fully attributed routes to their parent, whose attributes
//! are applied on top.
//!
//! Routes declared outside any group stay staged until the next flush; every
//! group call and both finalization passes flush first.

use crate::controller::{Controller, ControllerRegistry};
use crate::grouping::GroupAttributes;
use crate::logging::{debug, info, trace, warn};
use crate::route::{Action, ActionSpec, Route, RouteRef, DEFAULT_ORIGIN_GROUP, trim_slashes};
use crate::settings::{group_settings, SettingsStore};
use crate::{Error, HttpMethod};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Identity of a declared route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub origin_group: String,
    pub method: HttpMethod,
    pub pattern: String,
}

impl RouteKey {
    fn of(route: &Route) -> Self {
        Self {
            origin_group: route.origin_group().to_string(),
            method: route.http_method(),
            pattern: route.pattern().to_string(),
        }
    }
}

/// Routes keyed by [`RouteKey`], in insertion order.
///
/// [`RouteSet::merge`] accumulates: routes under a key that already exists
/// are appended, never dropped.
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    order: Vec<RouteKey>,
    entries: HashMap<RouteKey, Vec<RouteRef>>,
}

impl RouteSet {
    /// Insert, replacing whatever was under the same key.
    fn replace(&mut self, key: RouteKey, route: RouteRef) {
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key, vec![route]);
    }

    fn merge(&mut self, other: RouteSet) {
        let RouteSet { order, mut entries } = other;
        for key in order {
            let Some(routes) = entries.remove(&key) else {
                continue;
            };
            match self.entries.get_mut(&key) {
                Some(existing) => existing.extend(routes),
                None => {
                    self.order.push(key.clone());
                    self.entries.insert(key, routes);
                }
            }
        }
    }

    /// Every route, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteRef> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .flatten()
    }

    pub fn get(&self, key: &RouteKey) -> &[RouteRef] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.order.iter()
    }

    /// Number of routes, counting every route under a repeated key.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Finalized lookup table: method → joined pattern → frozen route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<HttpMethod, HashMap<String, Arc<Route>>>,
}

impl RouteTable {
    fn insert(&mut self, method: HttpMethod, pattern: String, route: Arc<Route>) {
        self.routes.entry(method).or_default().insert(pattern, route);
    }

    pub fn get(&self, method: HttpMethod, pattern: &str) -> Option<&Arc<Route>> {
        self.routes.get(&method).and_then(|routes| routes.get(pattern))
    }

    /// All routes registered for `method`, keyed by joined pattern.
    pub fn for_method(&self, method: HttpMethod) -> Option<&HashMap<String, Arc<Route>>> {
        self.routes.get(&method)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &str, &Arc<Route>)> {
        self.routes.iter().flat_map(|(method, routes)| {
            routes
                .iter()
                .map(move |(pattern, route)| (*method, pattern.as_str(), route))
        })
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct RegistryState {
    staging: RouteSet,
    screening: Vec<RouteSet>,
    routes: RouteSet,
    prefixed: Option<Arc<RouteTable>>,
    names: Vec<String>,
    fallback: Option<RouteRef>,
    entrance_enabled: bool,
    origins: Vec<String>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            staging: RouteSet::default(),
            screening: Vec::new(),
            routes: RouteSet::default(),
            prefixed: None,
            names: Vec::new(),
            fallback: None,
            entrance_enabled: true,
            origins: Vec::new(),
        }
    }
}

impl RegistryState {
    fn flush(&mut self) {
        if self.staging.is_empty() {
            return;
        }

        let staged = std::mem::take(&mut self.staging);
        trace!(
            routes = staged.len(),
            depth = self.screening.len(),
            "Flushing staged routes"
        );

        match self.screening.last_mut() {
            Some(frame) => frame.merge(staged),
            None => self.routes.merge(staged),
        }
    }
}

/// The route registry.
///
/// One instance per application: route files and the grouping facade
/// declare into it during bootstrap, then the finder finalizes it and the
/// frozen [`RouteTable`] is shared with request handling.
///
/// ```
/// use waypost_core::{GroupAttributes, HttpMethod, RouterService};
///
/// let router = RouterService::new();
/// router
///     .group(GroupAttributes::new().prefix("admin").middleware("auth"), |r| {
///         r.get("users", ["UserController", "index"])?.name("admin.users");
///         Ok(())
///     })
///     .unwrap();
///
/// let table = router.update_routes_with_prefix().unwrap();
/// router.load_names().unwrap();
///
/// assert!(table.get(HttpMethod::GET, "admin/users").is_some());
/// assert_eq!(router.route_names(), vec!["admin.users".to_string()]);
/// ```
pub struct RouterService {
    state: Mutex<RegistryState>,
    controllers: RwLock<ControllerRegistry>,
    settings: Option<Arc<dyn SettingsStore>>,
}

impl RouterService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            controllers: RwLock::new(ControllerRegistry::new()),
            settings: None,
        }
    }

    /// Use `settings` for per-group prefixes.
    pub fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn settings(&self) -> Option<&Arc<dyn SettingsStore>> {
        self.settings.as_ref()
    }

    /// Drop every route, name, controller and cached table, and reopen
    /// registration. Settings are kept.
    pub fn reset(&self) {
        *self.state.lock() = RegistryState::default();
        self.controllers.write().clear();
        debug!("Router reset");
    }

    pub fn register_controller(&self, controller: Controller) {
        self.controllers.write().register(controller);
    }

    // ------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------

    /// Origin group assigned to routes declared right now.
    pub fn current_origin_group(&self) -> String {
        self.state
            .lock()
            .origins
            .last()
            .cloned()
            .unwrap_or_else(|| DEFAULT_ORIGIN_GROUP.to_string())
    }

    /// Run `declare` with `group` as the origin group of every route it
    /// declares. The finder calls this once per route file.
    pub fn with_origin_group<T, F>(&self, group: &str, declare: F) -> Result<T, Error>
    where
        F: FnOnce(&RouterService) -> Result<T, Error>,
    {
        self.state.lock().origins.push(group.to_string());
        let outcome = declare(self);
        self.state.lock().origins.pop();
        outcome
    }

    /// Create a route in the current origin group and register it.
    pub fn route(
        &self,
        method: HttpMethod,
        pattern: &str,
        action: impl Into<ActionSpec>,
    ) -> Result<RouteRef, Error> {
        let mut route = Route::create(method, pattern, action, false)?;
        route.set_origin_group(self.current_origin_group());
        self.add_route(route)
    }

    pub fn get(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::GET, pattern, action)
    }

    pub fn post(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::POST, pattern, action)
    }

    pub fn put(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::PUT, pattern, action)
    }

    pub fn patch(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::PATCH, pattern, action)
    }

    pub fn delete(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::DELETE, pattern, action)
    }

    pub fn head(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::HEAD, pattern, action)
    }

    pub fn options(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        self.route(HttpMethod::OPTIONS, pattern, action)
    }

    /// Declare the fallback route (GET).
    pub fn fallback(&self, pattern: &str, action: impl Into<ActionSpec>) -> Result<RouteRef, Error> {
        let mut route = Route::create(HttpMethod::GET, pattern, action, true)?;
        route.set_origin_group(self.current_origin_group());
        self.add_fallback_route(route)
    }

    /// Stage a route. A fallback-flagged route also becomes the fallback.
    pub fn add_route(&self, route: Route) -> Result<RouteRef, Error> {
        let mut state = self.state.lock();

        if !state.entrance_enabled {
            warn!(
                method = %route.http_method(),
                pattern = route.pattern(),
                "Route registration rejected, entrance is closed"
            );
            return Err(Error::RegistrationClosed(route.pattern().to_string()));
        }

        let key = RouteKey::of(&route);
        let is_fallback = route.is_fallback();
        let handle = RouteRef::new(route);

        debug!(
            method = %key.method,
            pattern = %key.pattern,
            group = %key.origin_group,
            "Route staged"
        );

        state.staging.replace(key, handle.clone());
        if is_fallback {
            state.fallback = Some(handle.clone());
        }

        Ok(handle)
    }

    /// Stage a route and make it the fallback, replacing any earlier one.
    pub fn add_fallback_route(&self, route: Route) -> Result<RouteRef, Error> {
        let handle = self.add_route(route)?;
        self.state.lock().fallback = Some(handle.clone());
        Ok(handle)
    }

    /// Move staged routes into the active screening frame, or into the
    /// route set when no group is active.
    pub fn flush_routes(&self) {
        self.state.lock().flush();
    }

    /// Run one grouping call: stage `routes` as a batch and apply
    /// `attributes` to every route of the batch.
    ///
    /// If `routes` fails, the routes it declared are discarded and the error
    /// is returned.
    pub fn run_group<F>(&self, attributes: &GroupAttributes, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&RouterService) -> Result<(), Error>,
    {
        let (depth, fallback) = {
            let mut state = self.state.lock();
            state.flush();
            state.screening.push(RouteSet::default());
            (state.screening.len(), state.fallback.clone())
        };

        let outcome = routes(self);

        let mut state = self.state.lock();
        match outcome {
            Ok(()) => {
                state.flush();
                state.screening.truncate(depth);
                let batch = state.screening.pop().unwrap_or_default();

                for route in batch.iter() {
                    attributes.apply(route);
                }
                debug!(routes = batch.len(), depth, ?attributes, "Route group attributed");

                match state.screening.last_mut() {
                    Some(parent) => parent.merge(batch),
                    None => state.routes.merge(batch),
                }
                Ok(())
            }
            Err(err) => {
                state.staging = RouteSet::default();
                state.screening.truncate(depth - 1);
                state.fallback = fallback;
                warn!(depth, error = %err, "Route group failed, batch discarded");
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Claim every route name, failing on the first duplicate.
    ///
    /// Rebuilds the name index from scratch, so calling it twice is safe.
    pub fn load_names(&self) -> Result<&Self, Error> {
        let mut state = self.state.lock();
        state.flush();

        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for route in state.routes.iter() {
            let route = route.read();
            let Some(name) = route.get_name() else {
                continue;
            };

            if !seen.insert(name.to_string()) {
                warn!(name, pattern = route.pattern(), "Duplicate route name");
                return Err(Error::DuplicateRouteName(name.to_string()));
            }
            names.push(name.to_string());
        }

        debug!(names = names.len(), "Route names loaded");
        state.names = names;
        Ok(self)
    }

    /// Build the prefixed lookup table, or return the cached one.
    ///
    /// Each route is keyed by its group prefix (when its origin group has
    /// `use_prefix` set), then its own prefix, then its pattern.
    pub fn update_routes_with_prefix(&self) -> Result<Arc<RouteTable>, Error> {
        let mut state = self.state.lock();
        if let Some(table) = &state.prefixed {
            return Ok(Arc::clone(table));
        }

        state.flush();

        let groups = match &self.settings {
            Some(store) => group_settings(store.as_ref())?,
            None => HashMap::new(),
        };

        let mut table = RouteTable::default();
        for handle in state.routes.iter() {
            let route = self.freeze(handle);

            let group_prefix = match groups.get(route.origin_group()) {
                Some(group) if group.use_prefix => {
                    let prefix = group
                        .prefix
                        .as_deref()
                        .ok_or_else(|| Error::MissingGroupPrefix(route.origin_group().to_string()))?;
                    Some(trim_slashes(prefix)).filter(|p| !p.is_empty())
                }
                _ => None,
            };

            let pattern = match group_prefix {
                Some(prefix) => format!("{}/{}", prefix, route.prefixed_route()),
                None => route.prefixed_route(),
            };

            table.insert(route.http_method(), pattern, Arc::new(route));
        }

        info!(routes = table.len(), "Route table built");

        let table = Arc::new(table);
        state.prefixed = Some(Arc::clone(&table));
        Ok(table)
    }

    /// The prefixed lookup table, built on first use.
    pub fn routes(&self) -> Result<Arc<RouteTable>, Error> {
        self.update_routes_with_prefix()
    }

    pub fn is_finalized(&self) -> bool {
        self.state.lock().prefixed.is_some()
    }

    /// Snapshot of the attributed route set (not flushed first).
    pub fn grouped_routes(&self) -> RouteSet {
        self.state.lock().routes.clone()
    }

    pub fn route_names(&self) -> Vec<String> {
        self.state.lock().names.clone()
    }

    /// The fallback route as currently configured.
    pub fn fallback_route(&self) -> Option<Arc<Route>> {
        let fallback = self.state.lock().fallback.clone();
        fallback.map(|handle| Arc::new(self.freeze(&handle)))
    }

    /// Number of routes staged but not flushed yet.
    pub fn staged_len(&self) -> usize {
        self.state.lock().staging.len()
    }

    /// Number of grouping calls currently open.
    pub fn group_depth(&self) -> usize {
        self.state.lock().screening.len()
    }

    pub fn disable_entrance(&self) -> &Self {
        self.state.lock().entrance_enabled = false;
        debug!("Route entrance disabled");
        self
    }

    pub fn enable_entrance(&self) -> &Self {
        self.state.lock().entrance_enabled = true;
        debug!("Route entrance enabled");
        self
    }

    pub fn is_entrance_enabled(&self) -> bool {
        self.state.lock().entrance_enabled
    }

    /// Snapshot a route and pre-resolve its controller action.
    fn freeze(&self, handle: &RouteRef) -> Route {
        let mut route = handle.snapshot();

        let resolved = match (route.get_controller(), route.action()) {
            (Some(controller), Action::Method(method)) => {
                let handler = self.controllers.read().resolve(controller, method).cloned();
                if handler.is_none() {
                    warn!(controller, method = %method, "Controller action not registered");
                }
                handler
            }
            _ => None,
        };

        route.set_resolved(resolved);
        route
    }
}

impl Default for RouterService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RouterService")
            .field("staged", &state.staging.len())
            .field("routes", &state.routes.len())
            .field("group_depth", &state.screening.len())
            .field("finalized", &state.prefixed.is_some())
            .field("entrance_enabled", &state.entrance_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::settings::{GroupSettings, MemorySettings};
    use crate::{HttpRequest, HttpResponse};

    fn text(body: &'static str) -> Handler {
        Handler::new(move |_args| async move { Ok::<_, Error>(HttpResponse::text(body)) })
    }

    #[test]
    fn test_routes_stay_staged_until_flush() {
        let router = RouterService::new();
        router.get("users", "index").unwrap();
        router.post("users", "store").unwrap();

        assert_eq!(router.staged_len(), 2);
        assert!(router.grouped_routes().is_empty());

        router.flush_routes();
        assert_eq!(router.staged_len(), 0);
        assert_eq!(router.grouped_routes().len(), 2);

        router.flush_routes();
        assert_eq!(router.grouped_routes().len(), 2);
    }

    #[test]
    fn test_same_key_in_staging_is_replaced() {
        let router = RouterService::new();
        router.get("users", "first").unwrap();
        router.get("users", "second").unwrap();
        assert_eq!(router.staged_len(), 1);
    }

    #[test]
    fn test_repeated_flushes_accumulate() {
        let router = RouterService::new();
        router.get("users", "first").unwrap();
        router.flush_routes();
        router.get("users", "second").unwrap();
        router.get("posts", "index").unwrap();
        router.flush_routes();

        let grouped = router.grouped_routes();
        let key = RouteKey {
            origin_group: DEFAULT_ORIGIN_GROUP.to_string(),
            method: HttpMethod::GET,
            pattern: "users".to_string(),
        };
        assert_eq!(grouped.get(&key).len(), 2);
        assert_eq!(grouped.len(), 3);

        let patterns: Vec<String> = grouped.iter().map(|r| r.read().pattern().to_string()).collect();
        assert_eq!(patterns, vec!["users", "users", "posts"]);
    }

    #[test]
    fn test_origin_group_is_assigned() {
        let router = RouterService::new();
        router.get("home", "index").unwrap();

        let api = router
            .with_origin_group("api", |r| r.get("users", "index"))
            .unwrap();

        assert_eq!(api.read().origin_group(), "api");
        assert_eq!(router.current_origin_group(), DEFAULT_ORIGIN_GROUP);

        // same method and pattern, different groups: two keys
        router.with_origin_group("admin", |r| r.get("home", "index")).unwrap();
        router.flush_routes();
        assert_eq!(router.grouped_routes().keys().count(), 3);
    }

    #[test]
    fn test_entrance_gate() {
        let router = RouterService::new();
        router.disable_entrance();
        assert!(!router.is_entrance_enabled());

        let err = router.get("users", "index").unwrap_err();
        assert!(matches!(err, Error::RegistrationClosed(p) if p == "users"));
        assert_eq!(router.staged_len(), 0);

        router.enable_entrance();
        assert!(router.get("users", "index").is_ok());
    }

    #[test]
    fn test_fallback_is_set_immediately() {
        let router = RouterService::new();
        router.fallback("not-found", "missing").unwrap();

        let fallback = router.fallback_route().unwrap();
        assert!(fallback.is_fallback());
        assert_eq!(fallback.pattern(), "not-found");
        assert_eq!(fallback.http_method(), HttpMethod::GET);
    }

    #[test]
    fn test_second_fallback_replaces_pointer_but_both_stay_routed() {
        let router = RouterService::new();
        router.fallback("first", "missing").unwrap();
        router.fallback("second", "missing").unwrap();

        assert_eq!(router.fallback_route().unwrap().pattern(), "second");

        let table = router.update_routes_with_prefix().unwrap();
        assert!(table.get(HttpMethod::GET, "first").is_some());
        assert!(table.get(HttpMethod::GET, "second").is_some());
    }

    #[test]
    fn test_add_route_with_fallback_flag_sets_fallback() {
        let router = RouterService::new();
        router
            .add_route(Route::create(HttpMethod::GET, "users", "index", false).unwrap())
            .unwrap();
        assert!(router.fallback_route().is_none());

        let handle = router
            .add_route(Route::create(HttpMethod::GET, "x", "missing", true).unwrap())
            .unwrap();
        assert_eq!(router.fallback_route().unwrap().pattern(), "x");
        assert_eq!(router.staged_len(), 2);

        let table = router.routes().unwrap();
        assert!(table.get(HttpMethod::GET, "x").unwrap().is_fallback());
        assert!(handle.read().is_fallback());
    }

    #[test]
    fn test_group_attributes_apply_to_batch_only() {
        let router = RouterService::new();
        let outside = router.get("home", "index").unwrap();

        router
            .run_group(&GroupAttributes::new().middleware("auth"), |r| {
                r.get("dashboard", "show")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(outside.read().get_middleware(), None);
        assert_eq!(router.group_depth(), 0);
        assert_eq!(router.staged_len(), 0);

        let grouped = router.grouped_routes();
        let dashboard = grouped
            .iter()
            .find(|r| r.read().pattern() == "dashboard")
            .unwrap();
        assert_eq!(dashboard.read().get_middleware(), Some(&["auth".to_string()][..]));
    }

    #[test]
    fn test_failed_group_discards_batch() {
        let router = RouterService::new();
        router.fallback("keep", "missing").unwrap();

        let err = router
            .run_group(&GroupAttributes::new().prefix("api"), |r| {
                r.get("users", "index")?;
                r.fallback("lost", "missing")?;
                r.get("broken", ["OnlyController"])?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgumentArity { .. }));
        assert_eq!(router.group_depth(), 0);
        assert_eq!(router.fallback_route().unwrap().pattern(), "keep");

        let table = router.update_routes_with_prefix().unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get(HttpMethod::GET, "api/users").is_none());
    }

    #[test]
    fn test_duplicate_names() {
        let router = RouterService::new();
        router
            .with_origin_group("web", |r| r.get("/", "index").map(|h| { h.name("home"); }))
            .unwrap();
        router
            .with_origin_group("api", |r| r.get("/", "index").map(|h| { h.name("home"); }))
            .unwrap();

        let err = router.load_names().unwrap_err();
        assert!(matches!(err, Error::DuplicateRouteName(name) if name == "home"));
    }

    #[test]
    fn test_unnamed_routes_never_conflict() {
        let router = RouterService::new();
        router.get("a", "index").unwrap();
        router.get("b", "index").unwrap();
        router.get("c", "index").unwrap().name("c");

        router.load_names().unwrap();
        router.load_names().unwrap();
        assert_eq!(router.route_names(), vec!["c".to_string()]);
    }

    #[test]
    fn test_group_prefix_from_settings() {
        let settings = MemorySettings::new().with_group("api", GroupSettings::prefixed("/api/v1/"));
        let router = RouterService::new().with_settings(Arc::new(settings));

        router
            .with_origin_group("api", |r| r.get("users/{id}", "show"))
            .unwrap();
        router.get("about", "show").unwrap().prefix("pages");

        let table = router.update_routes_with_prefix().unwrap();
        assert!(table.get(HttpMethod::GET, "api/v1/users/{id}").is_some());
        assert!(table.get(HttpMethod::GET, "pages/about").is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_group_prefix() {
        let settings = MemorySettings::new().with_group(
            "api",
            GroupSettings {
                use_prefix: true,
                prefix: None,
            },
        );
        let router = RouterService::new().with_settings(Arc::new(settings));
        router.with_origin_group("api", |r| r.get("users", "index")).unwrap();

        let err = router.update_routes_with_prefix().unwrap_err();
        assert!(matches!(err, Error::MissingGroupPrefix(group) if group == "api"));
        assert!(!router.is_finalized());
    }

    #[test]
    fn test_prefixed_table_is_cached() {
        let router = RouterService::new();
        router.get("users", "index").unwrap();

        let first = router.update_routes_with_prefix().unwrap();
        router.get("late", "index").unwrap();
        let second = router.routes().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.get(HttpMethod::GET, "late").is_none());
    }

    #[test]
    fn test_frozen_routes_ignore_later_changes() {
        let router = RouterService::new();
        let handle = router.get("users", "index").unwrap();
        handle.name("before");

        let table = router.update_routes_with_prefix().unwrap();
        handle.name("after");

        let frozen = table.get(HttpMethod::GET, "users").unwrap();
        assert_eq!(frozen.get_name(), Some("before"));
    }

    #[tokio::test]
    async fn test_controller_actions_resolve_at_finalization() {
        let router = RouterService::new();
        router.register_controller(Controller::new("UserController").action("index", text("users")));

        router.get("users", ["UserController", "index"]).unwrap();
        router.get("posts", ["PostController", "index"]).unwrap();

        let table = router.update_routes_with_prefix().unwrap();
        let users = table.get(HttpMethod::GET, "users").unwrap();
        let res = users.call(&HttpRequest::new("GET", "/users")).await.unwrap();
        assert_eq!(res.body_str(), Some("users"));

        let posts = table.get(HttpMethod::GET, "posts").unwrap();
        let err = posts.call(&HttpRequest::new("GET", "/posts")).await.unwrap_err();
        assert!(matches!(err, Error::UnresolvedAction(_)));
    }

    #[test]
    fn test_reset() {
        let router = RouterService::new();
        router.get("users", "index").unwrap().name("users");
        router.update_routes_with_prefix().unwrap();
        router.load_names().unwrap();
        router.disable_entrance();

        router.reset();

        assert!(router.is_entrance_enabled());
        assert!(!router.is_finalized());
        assert!(router.route_names().is_empty());
        assert!(router.grouped_routes().is_empty());
        assert!(router.fallback_route().is_none());
    }

    #[test]
    fn test_router_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouterService>();
        assert_send_sync::<RouteTable>();
    }
}
