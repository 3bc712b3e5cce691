//! Route core module - hot path for request matching.

use std::fmt;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use tracing::debug;

use crate::dispatcher::Next;
use crate::error::ConfigError;
use crate::server::{Request, Response};

/// Maximum number of path parameters before heap allocation.
/// Most route patterns bind ≤4 parameters (e.g., `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Param names use `Arc<str>` instead of `String` because names come from the
/// static route table (known at registration time) and `Arc::clone()` is an
/// O(1) atomic increment. Values remain `String` as they are per-request data
/// from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Handler function bound to a route.
///
/// Invoked with exclusive access to the per-request [`Request`] and
/// [`Response`] plus the [`Next`] continuation. A handler fails by returning
/// `Err` or by panicking; both are recovered by the dispatcher and routed to
/// the error page machinery. Only the synchronous extent of the call is
/// guarded - failures deferred past the handler's return are not captured.
pub type Handler =
    Arc<dyn Fn(&mut Request, &mut Response, &mut Next) -> anyhow::Result<()> + Send + Sync>;

/// HTTP method selector for a route.
///
/// `Use` is the cross-cutting pseudo-method: it accepts any request method
/// and is what framework middleware routes are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    /// Matches any request method
    Use,
}

impl RouteMethod {
    /// Whether this route method accepts the given request method.
    #[inline]
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            RouteMethod::Use => true,
            RouteMethod::Get => *method == Method::GET,
            RouteMethod::Post => *method == Method::POST,
            RouteMethod::Put => *method == Method::PUT,
            RouteMethod::Patch => *method == Method::PATCH,
            RouteMethod::Delete => *method == Method::DELETE,
            RouteMethod::Head => *method == Method::HEAD,
            RouteMethod::Options => *method == Method::OPTIONS,
            RouteMethod::Trace => *method == Method::TRACE,
            RouteMethod::Connect => *method == Method::CONNECT,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Head => "HEAD",
            RouteMethod::Options => "OPTIONS",
            RouteMethod::Trace => "TRACE",
            RouteMethod::Connect => "CONNECT",
            RouteMethod::Use => "USE",
        };
        f.write_str(name)
    }
}

/// One parsed segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Must equal the request segment under the route's case rule
    Literal(String),
    /// Always matches; binds the request segment under the given name
    Param(Arc<str>),
    /// Matches one or more trailing request segments; only valid last
    Wildcard,
}

/// Parsed, immutable path pattern.
///
/// Patterns are segment sequences: literals, `:name` parameters, and a
/// trailing `*` wildcard. The bare pattern `*` matches any path, including
/// the root. Trailing slashes are normalized away at parse time (empty
/// segments are dropped), so `/` parses to the empty segment sequence.
#[derive(Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PathSegment>,
    match_all: bool,
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// Fails fast on an empty `:` parameter name or a wildcard that is not
    /// the final segment; these are registration-time configuration errors.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        if pattern == "*" {
            return Ok(Self {
                raw: pattern.to_string(),
                segments: vec![PathSegment::Wildcard],
                match_all: true,
            });
        }

        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(ConfigError::InvalidPathPattern {
                        pattern: pattern.to_string(),
                        reason: "wildcard `*` must be the final segment".to_string(),
                    });
                }
                segments.push(PathSegment::Wildcard);
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(ConfigError::InvalidPathPattern {
                        pattern: pattern.to_string(),
                        reason: "parameter segment `:` is missing a name".to_string(),
                    });
                }
                segments.push(PathSegment::Param(Arc::from(name)));
            } else {
                segments.push(PathSegment::Literal((*part).to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            match_all: false,
        })
    }

    /// The `*` pattern that matches any path.
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            raw: "*".to_string(),
            segments: vec![PathSegment::Wildcard],
            match_all: true,
        }
    }

    /// The pattern string as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is the bare `*` pattern.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    /// Parsed segments of the pattern.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Match the pattern against a request's path segments.
    ///
    /// Deterministic and side-effect-free. Returns the bound parameters on
    /// success; `None` on the first mismatching segment. A trailing wildcard
    /// consumes one or more request segments, so the request must have at
    /// least as many segments as the pattern.
    #[must_use]
    pub fn matches(&self, path: &[String], case_sensitive: bool) -> Option<ParamVec> {
        if self.match_all {
            return Some(ParamVec::new());
        }

        let has_wildcard = matches!(self.segments.last(), Some(PathSegment::Wildcard));
        if has_wildcard {
            // Wildcard stands in for one or more trailing segments.
            if path.len() < self.segments.len() {
                return None;
            }
        } else if path.len() != self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (segment, value) in self.segments.iter().zip(path.iter()) {
            match segment {
                PathSegment::Wildcard => break,
                PathSegment::Param(name) => {
                    params.push((Arc::clone(name), value.clone()));
                }
                PathSegment::Literal(lit) => {
                    let matched = if case_sensitive {
                        lit == value
                    } else {
                        lit.eq_ignore_ascii_case(value)
                    };
                    if !matched {
                        return None;
                    }
                }
            }
        }
        Some(params)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.raw).finish()
    }
}

/// Subdomain selector for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdomainPattern {
    /// `*`: matches any subdomain, including none
    Any,
    /// Exact subdomain, compared under the route's case rule
    Literal(String),
}

impl SubdomainPattern {
    /// Parse a subdomain pattern string (`*` is the wildcard).
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            SubdomainPattern::Any
        } else {
            SubdomainPattern::Literal(pattern.to_string())
        }
    }

    /// Match against a request subdomain (`None` when the request carries no
    /// subdomain).
    #[must_use]
    pub fn matches(&self, subdomain: Option<&str>, case_sensitive: bool) -> bool {
        match self {
            SubdomainPattern::Any => true,
            SubdomainPattern::Literal(expected) => {
                let actual = subdomain.unwrap_or("");
                if case_sensitive {
                    expected == actual
                } else {
                    expected.eq_ignore_ascii_case(actual)
                }
            }
        }
    }
}

impl Default for SubdomainPattern {
    fn default() -> Self {
        SubdomainPattern::Any
    }
}

/// Per-route options beyond method and path.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Subdomain the route is constrained to (default: any)
    pub subdomain: SubdomainPattern,
    /// Case-sensitive literal and subdomain comparison (default: false)
    pub case_sensitive: bool,
}

/// An immutable matcher + handler pair.
///
/// Pattern, method, subdomain, and case rule are fixed at construction; the
/// only per-use output is the parameter map a successful [`Route::matches`]
/// returns, which the dispatcher copies into the request. Routes are shared
/// across concurrent dispatchers behind `Arc` and hold no mutable state.
#[derive(Clone)]
pub struct Route {
    method: RouteMethod,
    path: PathPattern,
    subdomain: SubdomainPattern,
    case_sensitive: bool,
    handler: Handler,
}

impl Route {
    /// Create a route with default options (any subdomain, case-insensitive).
    #[must_use]
    pub fn new(method: RouteMethod, path: PathPattern, handler: Handler) -> Self {
        Self::with_options(method, path, handler, RouteOptions::default())
    }

    /// Create a route with explicit options.
    #[must_use]
    pub fn with_options(
        method: RouteMethod,
        path: PathPattern,
        handler: Handler,
        options: RouteOptions,
    ) -> Self {
        Self {
            method,
            path,
            subdomain: options.subdomain,
            case_sensitive: options.case_sensitive,
            handler,
        }
    }

    /// The route's method selector.
    #[must_use]
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    /// The route's path pattern.
    #[must_use]
    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    /// The route's subdomain pattern.
    #[must_use]
    pub fn subdomain(&self) -> &SubdomainPattern {
        &self.subdomain
    }

    /// Whether literal and subdomain comparison is case-sensitive.
    #[must_use]
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The bound handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether the route's subdomain pattern could match this request.
    ///
    /// Used to pre-filter the dispatcher's route list once per request so
    /// subdomains are not re-tested on every middleware hop.
    #[must_use]
    pub fn subdomain_could_match(&self, req: &Request) -> bool {
        self.subdomain
            .matches(req.subdomain.as_deref(), self.case_sensitive)
    }

    /// Test the route against a request.
    ///
    /// Checks method, subdomain, and path under the route's case rule.
    /// Returns the extracted path parameters on success. Never mutates the
    /// route; matching the same request twice yields identical output.
    #[must_use]
    pub fn matches(&self, req: &Request) -> Option<ParamVec> {
        if !self.method.accepts(&req.method) {
            return None;
        }
        if !self.subdomain_could_match(req) {
            return None;
        }
        let result = self.path.matches(&req.path, self.case_sensitive);
        debug!(
            method = %self.method,
            pattern = %self.path.as_str(),
            path = %req.href(),
            matched = result.is_some(),
            "Route match attempt"
        );
        result
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path.as_str())
            .field("subdomain", &self.subdomain)
            .field("case_sensitive", &self.case_sensitive)
            .finish_non_exhaustive()
    }
}
