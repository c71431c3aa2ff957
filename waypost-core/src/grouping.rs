//! Route groups
//!
//! A group wraps a batch of declarations and sets shared attributes on every
//! route the batch declares:
//!
//! ```
//! use waypost_core::RouterService;
//!
//! let router = RouterService::new();
//! router
//!     .group_prefix("api/v1", |r| {
//!         r.group_middleware(["auth", "throttle"], |r| {
//!             r.get("users", ["UserController", "index"])?;
//!             r.post("users", ["UserController", "store"])?;
//!             Ok(())
//!         })
//!     })
//!     .unwrap();
//! # assert!(router.routes().unwrap().len() == 2);
//! ```
//!
//! Attributes overwrite: when groups nest, the outermost group's value is the
//! one a route ends up with.

use crate::registry::RouterService;
use crate::route::{MiddlewareList, RouteRef};
use crate::Error;

/// Attributes a group sets on each route of its batch.
///
/// Builder methods ignore empty values, so an empty middleware list or an
/// empty controller name leaves the routes' own values in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAttributes {
    middleware: Option<MiddlewareList>,
    controller: Option<String>,
    prefix: Option<String>,
}

impl GroupAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareList>) -> Self {
        let middleware = middleware.into();
        self.middleware = (!middleware.is_empty()).then_some(middleware);
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        let controller = controller.into();
        self.controller = (!controller.is_empty()).then_some(controller);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_none() && self.controller.is_none() && self.prefix.is_none()
    }

    /// Set middleware, then controller, then prefix on `route`.
    pub(crate) fn apply(&self, route: &RouteRef) {
        if let Some(middleware) = &self.middleware {
            route.middleware(middleware.clone());
        }
        if let Some(controller) = &self.controller {
            route.controller(controller.clone());
        }
        if let Some(prefix) = &self.prefix {
            route.prefix(prefix);
        }
    }
}

impl RouterService {
    /// Declare `routes` with any combination of middleware, controller and
    /// prefix.
    pub fn group<F>(&self, attributes: GroupAttributes, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&RouterService) -> Result<(), Error>,
    {
        self.run_group(&attributes, routes)
    }

    /// Declare `routes` under `prefix`.
    pub fn group_prefix<F>(&self, prefix: &str, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&RouterService) -> Result<(), Error>,
    {
        let attributes = GroupAttributes {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        };
        self.run_group(&attributes, routes)
    }

    /// Declare `routes` as actions of `controller`.
    pub fn group_controller<F>(&self, controller: &str, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&RouterService) -> Result<(), Error>,
    {
        let attributes = GroupAttributes {
            controller: Some(controller.to_string()),
            ..Default::default()
        };
        self.run_group(&attributes, routes)
    }

    /// Declare `routes` behind `middleware`, replacing their own middleware.
    pub fn group_middleware<F>(
        &self,
        middleware: impl Into<MiddlewareList>,
        routes: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&RouterService) -> Result<(), Error>,
    {
        let attributes = GroupAttributes {
            middleware: Some(middleware.into()),
            ..Default::default()
        };
        self.run_group(&attributes, routes)
    }
}
