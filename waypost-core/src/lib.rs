// Core library for the Waypost router
// Route entity, staged registry, grouping facade, dispatcher, finder and matcher

pub mod controller;
pub mod discovery;
pub mod error;
pub mod finder;
pub mod grouping;
pub mod handler;
pub mod http;
pub mod logging;
pub mod matcher;
pub mod registry;
pub mod route;
pub mod settings;

// Re-export commonly used types
pub use controller::*;
pub use discovery::*;
pub use error::*;
pub use finder::{
    scan_directory, DeclaredRouteFiles, RouteFile, RouteFileLoader, RouteFiles, RouteFinder,
    DEFAULT_ROUTES_PATH,
};
pub use grouping::*;
pub use handler::*;
pub use http::*;
pub use matcher::*;
pub use registry::*;
pub use route::*;
pub use settings::*;

// Used by `route_file!`
#[doc(hidden)]
pub use inventory;
