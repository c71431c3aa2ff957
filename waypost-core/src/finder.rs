//! Route files and the route finder
//!
//! A route file is a named declaration function, run once at bootstrap
//! against the router. Its name doubles as the origin group of every route
//! it declares, which is how per-group prefix settings find their routes.
//!
//! The finder scans a routes directory and hands each file to a
//! [`RouteFileLoader`]. Two loaders ship with the crate:
//!
//! - [`RouteFiles`], an explicit table of declaration closures
//! - [`DeclaredRouteFiles`], which runs the files submitted with
//!   [`route_file!`](crate::route_file) anywhere in the binary
//!
//! ```
//! use waypost_core::{RouteFiles, RouteFinder, RouterService};
//!
//! let dir = std::env::temp_dir().join("waypost-doc-routes");
//! std::fs::create_dir_all(&dir).unwrap();
//! std::fs::write(dir.join("web.rs"), "").unwrap();
//!
//! let files = RouteFiles::new().file("web", |r| {
//!     r.get("/", "index")?.name("home");
//!     Ok(())
//! });
//!
//! let router = RouterService::new();
//! RouteFinder::new(&dir, files).find_routes(&router).unwrap();
//! assert_eq!(router.route_names(), vec!["home".to_string()]);
//! ```

use crate::logging::{debug, info};
use crate::registry::RouterService;
use crate::settings::{SettingsStore, ROUTES_PATH_KEY, SEAL_AFTER_LOAD_KEY};
use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory route files are loaded from when no setting says otherwise.
pub const DEFAULT_ROUTES_PATH: &str = "routes";

/// List the files in `path`, sorted by name.
pub fn scan_directory(path: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::PathNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Name of the route file at `path`, also its origin group.
pub fn route_file_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

/// Executes one route file against the router.
pub trait RouteFileLoader: Send + Sync {
    /// Run the declarations of the file at `path`.
    ///
    /// Returns [`Error::PathNotFound`] when the file is gone or the loader
    /// has no declarations for it.
    fn load(&self, path: &Path, router: &RouterService) -> Result<(), Error>;
}

type DeclareFn = Arc<dyn Fn(&RouterService) -> Result<(), Error> + Send + Sync>;

/// Route files declared as closures, keyed by file name.
#[derive(Clone, Default)]
pub struct RouteFiles {
    files: HashMap<String, DeclareFn>,
}

impl RouteFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: Fn(&RouterService) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.files.insert(name.into(), Arc::new(declare));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

impl fmt::Debug for RouteFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.files.keys().collect();
        names.sort();
        f.debug_struct("RouteFiles").field("files", &names).finish()
    }
}

impl RouteFileLoader for RouteFiles {
    fn load(&self, path: &Path, router: &RouterService) -> Result<(), Error> {
        let declare = route_file_name(path)
            .filter(|_| path.is_file())
            .and_then(|name| self.files.get(name))
            .ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?;
        declare(router)
    }
}

/// A route file submitted at link time with [`route_file!`](crate::route_file).
pub struct RouteFile {
    pub name: &'static str,
    pub declare: fn(&RouterService) -> Result<(), Error>,
}

impl RouteFile {
    pub const fn new(name: &'static str, declare: fn(&RouterService) -> Result<(), Error>) -> Self {
        Self { name, declare }
    }
}

inventory::collect!(RouteFile);

/// Submit a route file.
///
/// ```ignore
/// fn api(router: &RouterService) -> Result<(), Error> {
///     router.get("users", ["UserController", "index"])?;
///     Ok(())
/// }
///
/// waypost_core::route_file!("api", api);
/// ```
#[macro_export]
macro_rules! route_file {
    ($name:expr, $declare:path) => {
        $crate::inventory::submit! {
            $crate::finder::RouteFile::new($name, $declare)
        }
    };
}

/// Loader over every [`RouteFile`] submitted in the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredRouteFiles;

impl DeclaredRouteFiles {
    /// Names of all submitted route files.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = inventory::iter::<RouteFile>
            .into_iter()
            .map(|file| file.name)
            .collect();
        names.sort_unstable();
        names
    }
}

impl RouteFileLoader for DeclaredRouteFiles {
    fn load(&self, path: &Path, router: &RouterService) -> Result<(), Error> {
        let name = route_file_name(path)
            .filter(|_| path.is_file())
            .ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?;

        let file = inventory::iter::<RouteFile>
            .into_iter()
            .find(|file| file.name == name)
            .ok_or_else(|| Error::PathNotFound(path.to_path_buf()))?;

        (file.declare)(router)
    }
}

/// Loads every route file in a directory, then finalizes the router.
#[derive(Debug)]
pub struct RouteFinder<L> {
    directory: PathBuf,
    loader: L,
    seal: bool,
}

impl<L: RouteFileLoader> RouteFinder<L> {
    pub fn new(directory: impl Into<PathBuf>, loader: L) -> Self {
        Self {
            directory: directory.into(),
            loader,
            seal: true,
        }
    }

    /// Use the directory named by the `routes_path` setting, or
    /// [`DEFAULT_ROUTES_PATH`], and seal according to `seal_after_load`
    /// (on when unset).
    pub fn from_settings(settings: &dyn SettingsStore, loader: L) -> Result<Self, Error> {
        let directory = match settings.get(ROUTES_PATH_KEY)? {
            Some(serde_json::Value::String(path)) => PathBuf::from(path),
            Some(other) => {
                return Err(Error::Settings(format!(
                    "{} must be a string, got {}",
                    ROUTES_PATH_KEY, other
                )));
            }
            None => PathBuf::from(DEFAULT_ROUTES_PATH),
        };
        let seal = match settings.get(SEAL_AFTER_LOAD_KEY)? {
            Some(serde_json::Value::Bool(seal)) => seal,
            Some(other) => {
                return Err(Error::Settings(format!(
                    "{} must be a boolean, got {}",
                    SEAL_AFTER_LOAD_KEY, other
                )));
            }
            None => true,
        };
        Ok(Self::new(directory, loader).seal_after_load(seal))
    }

    /// Close registration once the routes are loaded. On by default.
    pub fn seal_after_load(mut self, seal: bool) -> Self {
        self.seal = seal;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn seals_after_load(&self) -> bool {
        self.seal
    }

    /// Load all route files, build the prefixed table and claim names.
    ///
    /// A missing directory loads nothing and leaves the router untouched. A
    /// file the loader cannot find is skipped. Returns the number of files
    /// loaded.
    pub fn find_routes(&self, router: &RouterService) -> Result<usize, Error> {
        let files = match scan_directory(&self.directory) {
            Ok(files) => files,
            Err(Error::PathNotFound(path)) => {
                debug!(path = %path.display(), "Routes directory not found, skipping");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut loaded = 0;
        for path in &files {
            let group = route_file_name(path).unwrap_or_default();

            match router.with_origin_group(group, |r| self.loader.load(path, r)) {
                Ok(()) => {
                    debug!(file = %path.display(), group, "Route file loaded");
                    loaded += 1;
                }
                Err(Error::PathNotFound(missing)) => {
                    debug!(file = %missing.display(), "Route file not found, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        let table = router.update_routes_with_prefix()?;
        router.load_names()?;

        if self.seal {
            router.disable_entrance();
        }

        info!(
            directory = %self.directory.display(),
            files = loaded,
            routes = table.len(),
            "Routes loaded"
        );

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GroupSettings, MemorySettings};
    use crate::HttpMethod;
    use serde_json::json;
    use tempfile::TempDir;

    fn routes_dir(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_scan_directory_lists_files_sorted() {
        let dir = routes_dir(&["web.rs", "api.rs"]);
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = scan_directory(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().filter_map(|p| route_file_name(p)).collect();
        assert_eq!(names, vec!["api", "web"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(scan_directory(&missing), Err(Error::PathNotFound(p)) if p == missing));
    }

    #[test]
    fn test_missing_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        let router = RouterService::new();
        router.get("early", "index").unwrap();

        let loaded = RouteFinder::new(dir.path().join("routes"), RouteFiles::new())
            .find_routes(&router)
            .unwrap();

        assert_eq!(loaded, 0);
        assert!(!router.is_finalized());
        assert!(router.is_entrance_enabled());
    }

    #[test]
    fn test_files_run_in_their_origin_group() {
        let dir = routes_dir(&["api.rs", "web.rs"]);
        let files = RouteFiles::new()
            .file("api", |r| r.get("users/{id}", "show").map(|_| ()))
            .file("web", |r| r.get("about", "show").map(|_| ()));

        let settings = MemorySettings::new().with_group("api", GroupSettings::prefixed("api/v1"));
        let router = RouterService::new().with_settings(Arc::new(settings));

        let loaded = RouteFinder::new(dir.path(), files).find_routes(&router).unwrap();
        assert_eq!(loaded, 2);

        let table = router.routes().unwrap();
        let user = table.get(HttpMethod::GET, "api/v1/users/{id}").unwrap();
        assert_eq!(user.origin_group(), "api");
        assert!(table.get(HttpMethod::GET, "about").is_some());
    }

    #[test]
    fn test_unknown_file_is_skipped() {
        let dir = routes_dir(&["web.rs", "README.md"]);
        let files = RouteFiles::new().file("web", |r| r.get("/", "index").map(|_| ()));

        let router = RouterService::new();
        let loaded = RouteFinder::new(dir.path(), files).find_routes(&router).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(router.routes().unwrap().len(), 1);
    }

    #[test]
    fn test_finder_seals_router() {
        let dir = routes_dir(&["web.rs"]);
        let files = RouteFiles::new().file("web", |r| r.get("/", "index").map(|_| ()));

        let router = RouterService::new();
        RouteFinder::new(dir.path(), files.clone()).find_routes(&router).unwrap();
        assert!(!router.is_entrance_enabled());
        assert!(matches!(router.get("late", "index"), Err(Error::RegistrationClosed(_))));

        let open = RouterService::new();
        RouteFinder::new(dir.path(), files)
            .seal_after_load(false)
            .find_routes(&open)
            .unwrap();
        assert!(open.is_entrance_enabled());
    }

    #[test]
    fn test_declaration_errors_abort() {
        let dir = routes_dir(&["a.rs", "b.rs"]);
        let files = RouteFiles::new()
            .file("a", |r| r.get("/", "index").map(|h| { h.name("home"); }))
            .file("b", |r| r.get("start", "index").map(|h| { h.name("home"); }));

        let router = RouterService::new();
        let err = RouteFinder::new(dir.path(), files).find_routes(&router).unwrap_err();
        assert!(matches!(err, Error::DuplicateRouteName(name) if name == "home"));
    }

    #[test]
    fn test_from_settings() {
        let settings = MemorySettings::new().with(ROUTES_PATH_KEY, json!("config/routes"));
        let finder = RouteFinder::from_settings(&settings, RouteFiles::new()).unwrap();
        assert_eq!(finder.directory(), Path::new("config/routes"));
        assert!(finder.seals_after_load());

        let finder = RouteFinder::from_settings(&MemorySettings::new(), RouteFiles::new()).unwrap();
        assert_eq!(finder.directory(), Path::new(DEFAULT_ROUTES_PATH));

        let bad = MemorySettings::new().with(ROUTES_PATH_KEY, json!(42));
        assert!(matches!(
            RouteFinder::from_settings(&bad, RouteFiles::new()),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_from_settings_reads_seal_after_load() {
        let dir = routes_dir(&["web.rs"]);
        let settings = MemorySettings::new()
            .with(ROUTES_PATH_KEY, json!(dir.path().to_string_lossy()))
            .with(SEAL_AFTER_LOAD_KEY, json!(false));
        let files = RouteFiles::new().file("web", |r| r.get("home", "index").map(|_| ()));

        let finder = RouteFinder::from_settings(&settings, files).unwrap();
        assert!(!finder.seals_after_load());

        let router = RouterService::new();
        assert_eq!(finder.find_routes(&router).unwrap(), 1);
        assert!(router.is_entrance_enabled());

        let bad = MemorySettings::new().with(SEAL_AFTER_LOAD_KEY, json!("no"));
        assert!(matches!(
            RouteFinder::from_settings(&bad, RouteFiles::new()),
            Err(Error::Settings(msg)) if msg.contains(SEAL_AFTER_LOAD_KEY)
        ));
    }

    fn declared_admin(router: &RouterService) -> Result<(), Error> {
        router.group_prefix("admin", |r| {
            r.get("dashboard", "show")?.name("admin.dashboard");
            Ok(())
        })
    }

    crate::route_file!("finder_test_admin", declared_admin);

    #[test]
    fn test_declared_route_files() {
        assert!(DeclaredRouteFiles::names().contains(&"finder_test_admin"));

        let dir = routes_dir(&["finder_test_admin.rs", "unknown.rs"]);
        let router = RouterService::new();
        let loaded = RouteFinder::new(dir.path(), DeclaredRouteFiles)
            .find_routes(&router)
            .unwrap();

        assert_eq!(loaded, 1);
        let table = router.routes().unwrap();
        let route = table.get(HttpMethod::GET, "admin/dashboard").unwrap();
        assert_eq!(route.origin_group(), "finder_test_admin");
        assert_eq!(router.route_names(), vec!["admin.dashboard".to_string()]);
    }
}
