//! Route discovery from a directory tree.
//!
//! # Responsibilities
//! - Walk the routes directory recursively
//! - Derive method and URI template from each file name
//! - Accumulate middleware declarations from ancestor directories
//!
//! # Conventions
//! ```text
//! routes/
//!   __middleware.route        → middleware for everything below
//!   index.GET.route           → GET  /
//!   about.route               → ANY  /about
//!   posts/
//!     _pid/index.GET.route    → GET  /posts/:pid
//! ```
//!
//! # Design Decisions
//! - Entries are visited in sorted order so route precedence does not
//!   depend on the filesystem
//! - Files at a level come before the subdirectories of that level
//! - A directory's own middleware applies to the files beside it

use std::fs;
use std::path::Path;

use crate::error::DiscoveryError;
use crate::routing::matcher::ANY_METHOD;
use crate::routing::route::Route;

/// File stem that declares middleware for a directory.
pub const MIDDLEWARE_STEM: &str = "__middleware";

/// Stem of the file that maps to its directory's own URI.
pub const INDEX_STEM: &str = "index";

struct Entry {
    name: String,
    is_dir: bool,
}

/// Scans `root` and returns its routes in precedence order.
pub fn discover(root: &Path) -> Result<Vec<Route>, DiscoveryError> {
    let mut routes = Vec::new();
    walk(root, "", &[], &mut routes)?;
    tracing::debug!(root = %root.display(), count = routes.len(), "Routes discovered");
    Ok(routes)
}

fn walk(
    dir: &Path,
    prefix: &str,
    inherited: &[String],
    routes: &mut Vec<Route>,
) -> Result<(), DiscoveryError> {
    let entries = read_sorted(dir)?;

    let mut middleware = inherited.to_vec();
    middleware.extend(
        entries
            .iter()
            .filter(|e| !e.is_dir && is_middleware(&e.name))
            .map(|e| format!("{}/{}", prefix, e.name)),
    );

    let mut dirs = Vec::new();
    for entry in entries {
        if entry.is_dir {
            dirs.push(entry.name);
        } else if !is_middleware(&entry.name) {
            let route = file_to_route(prefix, &entry.name, middleware.clone());
            tracing::trace!(route = %route, artifact = route.artifact(), "Discovered route");
            routes.push(route);
        }
    }

    for name in dirs {
        walk(
            &dir.join(&name),
            &format!("{}/{}", prefix, name),
            &middleware,
            routes,
        )?;
    }
    Ok(())
}

fn read_sorted(dir: &Path) -> Result<Vec<Entry>, DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: entry.path().is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

fn is_middleware(file_name: &str) -> bool {
    file_stem(file_name) == MIDDLEWARE_STEM
}

/// Builds the route for `file_name` found under the directory `prefix`
/// (`/`-separated, relative to the root, empty for the root itself).
pub fn file_to_route(prefix: &str, file_name: &str, middleware: Vec<String>) -> Route {
    let mut parts = file_stem(file_name).split('.');
    let terminal = parts.next().unwrap_or_default();
    let method = parts
        .next()
        .map(str::to_uppercase)
        .unwrap_or_else(|| ANY_METHOD.to_string());

    let mut segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    if terminal != INDEX_STEM && !terminal.is_empty() {
        segments.push(terminal);
    }

    let uri = if segments.is_empty() {
        "/".to_string()
    } else {
        segments
            .iter()
            .map(|s| match s.strip_prefix('_') {
                Some(name) => format!("/:{}", name),
                None => format!("/{}", s),
            })
            .collect()
    };

    Route::new(method, uri, format!("{}/{}", prefix, file_name), middleware)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_file_to_route() {
        let route = file_to_route("/posts/_pid", "index.get.route", vec![]);
        assert_eq!(route.method(), "GET");
        assert_eq!(route.uri(), "/posts/:pid");
        assert_eq!(route.artifact(), "/posts/_pid/index.get.route");

        let route = file_to_route("", "index.route", vec![]);
        assert_eq!(route.method(), "ANY");
        assert_eq!(route.uri(), "/");

        let route = file_to_route("/content", "text.route", vec![]);
        assert_eq!(route.uri(), "/content/text");

        let route = file_to_route("/users", "_uid.DELETE.route", vec![]);
        assert_eq!(route.method(), "DELETE");
        assert_eq!(route.uri(), "/users/:uid");
    }

    #[test]
    fn test_discover_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "__middleware.route");
        touch(root, "index.GET.route");
        touch(root, "about.route");
        touch(root, "posts/_pid/index.GET.route");
        touch(root, "users/__middleware.route");
        touch(root, "users/_uid.GET.route");
        touch(root, "users/admin/__middleware.route");
        touch(root, "users/admin/index.route");

        let routes = discover(root).unwrap();
        let summary: Vec<String> = routes.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            summary,
            vec![
                "ANY  /about",
                "GET  /",
                "GET  /posts/:pid",
                "GET  /users/:uid",
                "ANY  /users/admin",
            ]
        );

        assert_eq!(routes[2].middleware(), ["/__middleware.route"]);
        assert_eq!(
            routes[3].middleware(),
            ["/__middleware.route", "/users/__middleware.route"]
        );
        assert_eq!(
            routes[4].middleware(),
            [
                "/__middleware.route",
                "/users/__middleware.route",
                "/users/admin/__middleware.route"
            ]
        );
    }

    #[test]
    fn test_route_count_excludes_middleware() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "__middleware.route");
        touch(dir.path(), "a.route");
        touch(dir.path(), "b/c.route");
        touch(dir.path(), "b/__middleware.route");
        assert_eq!(discover(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DiscoveryError::Io { .. }));
    }
}
