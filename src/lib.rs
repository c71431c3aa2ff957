// Waypost - route registration and dispatch
//
// Route files declare routes into a staged registry; groups attach prefixes,
// middleware and controllers; the finder freezes everything into a lookup
// table; a per-request matcher picks a route and the dispatcher binds the
// handler's parameters by name.

// Re-export core functionality
pub use waypost_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use waypost_config;

#[cfg(feature = "config")]
pub use waypost_config::{ConfigManager, RouterConfig};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Arguments,
        Controller,
        DeclaredRouteFiles,
        Error,
        GroupAttributes,
        Handler,
        HttpMethod,
        HttpRequest,
        HttpResponse,
        RouteDiscovery,
        RouteFiles,
        RouteFinder,
        RouteMatch,
        RouteRef,
        RouterService,
        TableDiscovery,
    };

    pub use crate::route_file;

    #[cfg(feature = "config")]
    pub use crate::{ConfigManager, RouterConfig};
}
