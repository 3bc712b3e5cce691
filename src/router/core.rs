//! Router core module - registration-time route table construction.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatcher::Next;
use crate::error::ConfigError;
use crate::route::{Handler, PathPattern, Route, RouteMethod, RouteOptions};
use crate::server::{Request, Response, SendFileOptions};
use crate::static_files::{StaticFiles, StaticOptions};

macro_rules! verb_method {
    (
        $(#[$doc:meta])* $name:ident,
        $(#[$doc_with:meta])* $with_name:ident,
        $method:expr
    ) => {
        $(#[$doc])*
        pub fn $name<F>(&mut self, path: &str, handler: F) -> Result<&mut Self, ConfigError>
        where
            F: Fn(&mut Request, &mut Response, &mut Next) -> anyhow::Result<()>
                + Send
                + Sync
                + 'static,
        {
            self.route($method, path, Arc::new(handler), RouteOptions::default())
        }

        $(#[$doc_with])*
        pub fn $with_name<F>(
            &mut self,
            path: &str,
            handler: F,
            options: RouteOptions,
        ) -> Result<&mut Self, ConfigError>
        where
            F: Fn(&mut Request, &mut Response, &mut Next) -> anyhow::Result<()>
                + Send
                + Sync
                + 'static,
        {
            self.route($method, path, Arc::new(handler), options)
        }
    };
}

/// Construction-time route table builder.
///
/// Appends routes to a server-wide ordered collection; registration order
/// is dispatch order. All validation here is fail-fast: invalid patterns,
/// unreadable static roots, and missing favicon files raise a
/// [`ConfigError`] immediately rather than surfacing at request time.
/// Freeze the table once startup is complete - the resulting
/// [`RouteRegistry`] is immutable and shared by every request.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route with explicit method and options.
    ///
    /// The per-verb convenience methods all funnel through here.
    pub fn route(
        &mut self,
        method: RouteMethod,
        path: &str,
        handler: Handler,
        options: RouteOptions,
    ) -> Result<&mut Self, ConfigError> {
        let pattern = PathPattern::parse(path)?;
        debug!(method = %method, path = %pattern.as_str(), "Route registered");
        self.routes
            .push(Arc::new(Route::with_options(method, pattern, handler, options)));
        Ok(self)
    }

    verb_method!(
        /// Register a GET route.
        get,
        /// Register a GET route with explicit per-route options.
        get_with,
        RouteMethod::Get
    );
    verb_method!(
        /// Register a POST route.
        post,
        /// Register a POST route with explicit per-route options.
        post_with,
        RouteMethod::Post
    );
    verb_method!(
        /// Register a PUT route.
        put,
        /// Register a PUT route with explicit per-route options.
        put_with,
        RouteMethod::Put
    );
    verb_method!(
        /// Register a PATCH route.
        patch,
        /// Register a PATCH route with explicit per-route options.
        patch_with,
        RouteMethod::Patch
    );
    verb_method!(
        /// Register a DELETE route.
        delete,
        /// Register a DELETE route with explicit per-route options.
        delete_with,
        RouteMethod::Delete
    );
    verb_method!(
        /// Register a HEAD route.
        head,
        /// Register a HEAD route with explicit per-route options.
        head_with,
        RouteMethod::Head
    );
    verb_method!(
        /// Register an OPTIONS route.
        options,
        /// Register an OPTIONS route with explicit per-route options.
        options_with,
        RouteMethod::Options
    );
    verb_method!(
        /// Register a TRACE route.
        trace,
        /// Register a TRACE route with explicit per-route options.
        trace_with,
        RouteMethod::Trace
    );
    verb_method!(
        /// Register a CONNECT route.
        connect,
        /// Register a CONNECT route with explicit per-route options.
        connect_with,
        RouteMethod::Connect
    );
    verb_method!(
        /// Register a USE route, matching any method.
        use_,
        /// Register a USE route with explicit per-route options.
        use_with,
        RouteMethod::Use
    );

    /// Mount a directory of static files at `mount`.
    ///
    /// Registers a GET route for `mount/*` backed by a [`StaticFiles`]
    /// resolver. The root is validated readable here, at registration time.
    pub fn static_mount(
        &mut self,
        mount: &str,
        root: impl Into<PathBuf>,
        options: StaticOptions,
    ) -> Result<&mut Self, ConfigError> {
        let files = StaticFiles::new(mount, root, options)?;
        self.routes.push(Arc::new(files.into_route()));
        Ok(self)
    }

    /// Register a dedicated GET `/favicon.ico` route.
    ///
    /// `dir` must be a readable directory containing a file whose name
    /// starts with `favicon`; the first such entry is served. Validation is
    /// immediate - a missing favicon aborts startup, it does not 404 later.
    pub fn favicon(&mut self, dir: impl Into<PathBuf>) -> Result<&mut Self, ConfigError> {
        let dir: PathBuf = dir.into();
        let entries = fs::read_dir(&dir).map_err(|source| ConfigError::FaviconDirUnreadable {
            dir: dir.clone(),
            source,
        })?;

        let mut favicon_path: Option<PathBuf> = None;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && name.starts_with("favicon") {
                favicon_path = Some(entry.path());
                break;
            }
        }
        let favicon_path = favicon_path.ok_or(ConfigError::FaviconMissing { dir })?;

        info!(path = %favicon_path.display(), "Favicon registered");
        self.get("/favicon.ico", move |req, res, _next| {
            if let Err(err) = res
                .status(200)
                .send_file(&favicon_path, SendFileOptions::default())
            {
                res.status(500).json(serde_json::json!({
                    "error": err.to_string(),
                    "href": req.href(),
                }));
            }
            Ok(())
        })
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Print all registered routes to stdout.
    ///
    /// Useful for verifying the table at startup.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!("[route] {} {}", route.method(), route.path().as_str());
        }
    }

    /// Freeze the table into the immutable registry shared with request
    /// dispatchers.
    #[must_use]
    pub fn freeze(self) -> RouteRegistry {
        let summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method(), r.path().as_str()))
            .collect();
        info!(
            routes_count = self.routes.len(),
            routes_summary = ?summary,
            "Routing table frozen"
        );
        RouteRegistry {
            routes: self.routes,
        }
    }
}

/// Immutable, server-owned route collection.
///
/// Produced by [`RouteTable::freeze`] after startup. Per-request
/// dispatchers read it concurrently; it is never mutated while the server
/// is serving, so no synchronization is required.
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    /// All registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
