//! Static filesystem resolution for mounted directory routes.
//!
//! A [`StaticFiles`] resolver backs the route a `static_mount` registers:
//! it strips the mount prefix off the request path, applies the dotfiles
//! policy, resolves the containing directory against the trusted root (so
//! traversal segments can never escape it), looks the final segment up in
//! the directory listing under the configured case rule, honors an
//! `eTags.json` manifest, and records the file send with cache-validation
//! headers. Everything that is not clearly a server fault falls through to
//! the next route instead of erroring.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Next;
use crate::error::ConfigError;
use crate::route::{PathPattern, Route, RouteMethod, RouteOptions};
use crate::server::{parse_path_segments, Request, Response, SendFileOptions};

/// Manifest file mapping file names to precomputed ETag values.
pub const ETAG_MANIFEST: &str = "eTags.json";

/// How filesystem entries whose name starts with `.` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotfilesPolicy {
    /// Serve them like any other file
    Allow,
    /// Pretend they do not exist (fall through to the next route)
    #[default]
    Ignore,
    /// Answer with the canned 401 page
    Deny,
}

/// Options for a static mount.
#[derive(Debug, Clone, Copy)]
pub struct StaticOptions {
    pub dotfiles: DotfilesPolicy,
    /// Case-sensitive file name lookup (default: false)
    pub case_sensitive: bool,
    /// `Cache-Control` max-age for served files, in seconds
    pub max_age_secs: u32,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            dotfiles: DotfilesPolicy::default(),
            case_sensitive: false,
            max_age_secs: 3600,
        }
    }
}

/// A path segment is only allowed to descend the tree if it is a single
/// normal component; `.`, `..`, and separator-bearing segments are treated
/// as misses.
fn is_normal_component(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Filesystem resolver behind a static mount route.
///
/// Constructed once at server setup; the root must exist and be a readable
/// directory or construction fails. The stored root is canonical, so every
/// per-request resolution can be boundary-checked against it.
pub struct StaticFiles {
    mount: Vec<String>,
    pattern: PathPattern,
    root: PathBuf,
    dotfiles: DotfilesPolicy,
    case_sensitive: bool,
    max_age_secs: u32,
}

impl StaticFiles {
    /// Validate and build a resolver for `root` mounted at `mount`.
    pub fn new(
        mount: &str,
        root: impl Into<PathBuf>,
        options: StaticOptions,
    ) -> Result<Self, ConfigError> {
        let root: PathBuf = root.into();
        let canonical = root
            .canonicalize()
            .map_err(|source| ConfigError::StaticRootUnreadable {
                root: root.clone(),
                source,
            })?;
        if !canonical.is_dir() {
            return Err(ConfigError::StaticRootNotADirectory { root });
        }
        // Readability probe; a root we cannot list would turn every request
        // into a miss.
        fs::read_dir(&canonical).map_err(|source| ConfigError::StaticRootUnreadable {
            root: root.clone(),
            source,
        })?;

        let mount_segments = parse_path_segments(mount);
        let pattern_str = if mount_segments.is_empty() {
            "*".to_string()
        } else {
            format!("/{}/*", mount_segments.join("/"))
        };
        let pattern = PathPattern::parse(&pattern_str)?;

        info!(
            mount = %pattern_str,
            root = %canonical.display(),
            dotfiles = ?options.dotfiles,
            "Static mount configured"
        );

        Ok(Self {
            mount: mount_segments,
            pattern,
            root: canonical,
            dotfiles: options.dotfiles,
            case_sensitive: options.case_sensitive,
            max_age_secs: options.max_age_secs,
        })
    }

    /// The canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path pattern the mount route is registered under.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Wrap the resolver into a GET route.
    ///
    /// The handler converts any unexpected resolution failure into a JSON
    /// 500 response carrying the error and the request href; it never
    /// returns `Err`, so a filesystem surprise can never trip the
    /// dispatcher's recovery machinery.
    #[must_use]
    pub fn into_route(self) -> Route {
        let pattern = self.pattern.clone();
        let case_sensitive = self.case_sensitive;
        let files = Arc::new(self);
        Route::with_options(
            RouteMethod::Get,
            pattern,
            Arc::new(move |req, res, next| {
                if let Err(err) = files.serve(req, res, next) {
                    error!(error = %err, href = %req.href(), "Static resolution failed");
                    res.status(500).json(serde_json::json!({
                        "error": err.to_string(),
                        "href": req.href(),
                    }));
                }
                Ok(())
            }),
            RouteOptions {
                case_sensitive,
                ..RouteOptions::default()
            },
        )
    }

    /// Resolve and serve one request.
    ///
    /// Soft misses (missing file, traversal segments, unreadable
    /// directories, ignored dotfiles) fall through via `next`; only a
    /// violated mount-length invariant is a hard 500 here. Unexpected
    /// errors bubble up to the wrapper in [`StaticFiles::into_route`].
    fn serve(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Next,
    ) -> anyhow::Result<()> {
        if req.path.len() < self.mount.len() {
            // Matching pre-filters this; reaching it means the route was
            // invoked outside its mount.
            warn!(
                href = %req.href(),
                mount_len = self.mount.len(),
                "Request path shorter than static mount path"
            );
            res.status(500).json(serde_json::json!({
                "error": "request path is shorter than the static mount path",
                "href": req.href(),
            }));
            return Ok(());
        }

        let rel: Vec<String> = req.path[self.mount.len()..].to_vec();
        if rel.is_empty() {
            next.proceed();
            return Ok(());
        }

        for segment in &rel {
            if segment.starts_with('.') {
                match self.dotfiles {
                    DotfilesPolicy::Allow => {}
                    DotfilesPolicy::Ignore => {
                        debug!(segment = %segment, "Dotfile ignored");
                        next.proceed();
                        return Ok(());
                    }
                    DotfilesPolicy::Deny => {
                        debug!(segment = %segment, "Dotfile denied");
                        res.pages().unauthorized();
                        return Ok(());
                    }
                }
            }
        }

        let (dir_segments, last) = rel.split_at(rel.len() - 1);
        let file_name = &last[0];

        if !is_normal_component(file_name)
            || dir_segments.iter().any(|s| !is_normal_component(s))
        {
            debug!(href = %req.href(), "Non-normal path segment, treating as miss");
            next.proceed();
            return Ok(());
        }

        let mut dir = self.root.clone();
        for segment in dir_segments {
            dir.push(segment);
        }
        // Resolution always starts from the trusted root and the canonical
        // directory must still live under it, so `..` and symlink tricks
        // cannot read outside the mount.
        let dir = match dir.canonicalize() {
            Ok(dir) => dir,
            Err(err) => {
                debug!(error = %err, href = %req.href(), "Containing directory unresolvable");
                next.proceed();
                return Ok(());
            }
        };
        if !dir.starts_with(&self.root) || !dir.is_dir() {
            debug!(href = %req.href(), "Containing directory outside root or not a directory");
            next.proceed();
            return Ok(());
        }

        let Some(entry_name) = self.find_entry(&dir, file_name)? else {
            debug!(file = %file_name, dir = %dir.display(), "No matching file entry");
            next.proceed();
            return Ok(());
        };
        let file_path = dir.join(&entry_name);

        if let Some(tag) = self.manifest_etag(&dir, &entry_name)? {
            res.set_header("ETag", tag);
        }

        res.status(200).send_file(
            &file_path,
            SendFileOptions {
                max_age_secs: self.max_age_secs,
            },
        )?;
        info!(path = %file_path.display(), href = %req.href(), "Static file served");
        Ok(())
    }

    /// Look the final segment up in the directory listing under the case
    /// rule. Only regular files count.
    fn find_entry(&self, dir: &Path, file_name: &str) -> anyhow::Result<Option<String>> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("listing directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let matched = if self.case_sensitive {
                name == file_name
            } else {
                name.eq_ignore_ascii_case(file_name)
            };
            if matched {
                return Ok(Some(name.to_string()));
            }
        }
        Ok(None)
    }

    /// ETag for a file from the directory's `eTags.json` manifest, if both
    /// exist. A malformed manifest is a real error - it means the deploy
    /// pipeline produced garbage - and surfaces as a 500.
    fn manifest_etag(&self, dir: &Path, file_name: &str) -> anyhow::Result<Option<String>> {
        let manifest = dir.join(ETAG_MANIFEST);
        if !manifest.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&manifest)
            .with_context(|| format!("reading {}", manifest.display()))?;
        let tags: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", manifest.display()))?;
        Ok(tags.get(file_name).cloned())
    }
}
