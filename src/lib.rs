//! # Gantry
//!
//! **Gantry** is the request-dispatch core of an HTTP server framework:
//! ordered route matching, a per-request continuation-driven dispatcher with
//! built-in failure recovery, and a hardened static file resolver.
//!
//! ## Overview
//!
//! The crate deliberately stops at the dispatch boundary. A transport layer
//! (connection handling, HTTP parsing, TLS) produces a normalized
//! [`Request`](server::Request) and an empty [`Response`](server::Response)
//! buffer; Gantry runs the route chain over them and hands both back for
//! serialization. Everything in between - which handlers run, in what order,
//! what happens when one fails - is this crate's job.
//!
//! ## Architecture
//!
//! - **[`route`]** - route primitives: path patterns (`:param`, trailing
//!   `*`), subdomain patterns, HTTP method matching, and the [`route::Route`]
//!   type binding them to a handler
//! - **[`router`]** - the registration-time [`router::RouteTable`] builder
//!   and the frozen, immutable [`router::RouteRegistry`] the server shares
//!   with every request
//! - **[`dispatcher`]** - the per-request [`dispatcher::RequestDispatcher`]
//!   state machine: sequential chain execution, the [`dispatcher::Next`]
//!   continuation, and recovery-route splicing on handler failure
//! - **[`middleware`]** - the cross-cutting routes prepended to every chain
//!   (locale negotiation, color-scheme cookie normalization)
//! - **[`static_files`]** - filesystem resolution behind static mounts:
//!   traversal containment, dotfile policy, `eTags.json` manifests
//! - **[`server`]** - the [`server::Request`]/[`server::Response`] interface
//!   types and the [`server::ServerConfig`] hooks
//! - **[`error`]** - fail-fast configuration errors
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Dispatcher as RequestDispatcher
//!     participant MW as Cross-cutting routes<br/>(session, locale, color scheme, logger)
//!     participant Route as Matching route handler
//!     participant Recovery as Spliced recovery route
//!
//!     Transport->>Dispatcher: new(registry, request, response, config)
//!     Dispatcher->>Dispatcher: Filter registry by subdomain
//!     Dispatcher->>Dispatcher: Prepend cross-cutting routes
//!     Transport->>Dispatcher: run()
//!
//!     Dispatcher->>MW: handler(req, res, next)
//!     MW->>MW: Negotiate language / normalize cookies
//!     MW-->>Dispatcher: next.proceed()
//!
//!     Dispatcher->>Route: handler(req, res, next)
//!
//!     alt Handler succeeds
//!         Route->>Route: res.status(200).json(...)
//!         Route-->>Dispatcher: return without proceed
//!         Dispatcher-->>Transport: (request, response)
//!     else Handler fails (Err or panic)
//!         Route-->>Dispatcher: failure captured
//!         Dispatcher->>Dispatcher: Splice recovery route at cursor
//!         Dispatcher->>Recovery: handler(req, res, next)
//!         Recovery->>Recovery: on_http_error callback,<br/>or generic 500 page
//!         Recovery-->>Dispatcher: return
//!         Dispatcher-->>Transport: (request, response)
//!     else Chain exhausted
//!         Dispatcher->>Dispatcher: Canned 404 page
//!         Dispatcher-->>Transport: (request, response)
//!     end
//! ```
//!
//! ### Key Properties
//!
//! 1. **Registration order is dispatch order**: routes run in the order they
//!    were registered, cross-cutting routes first
//! 2. **First send wins**: once a handler sends, later sends are ignored, so
//!    recovery can never clobber a committed response
//! 3. **Failures never escape**: a handler `Err` or panic is converted into
//!    an [`dispatcher::HttpError`] and handled in-chain
//! 4. **Nothing shared between requests**: each dispatcher owns its request,
//!    response, and route list; the dispatch path takes no locks
//! 5. **Fail-fast configuration**: bad patterns, unreadable static roots, and
//!    missing favicons abort startup instead of surfacing at request time
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use gantry::{Request, RequestDispatcher, Response, RouteTable, ServerConfig};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table
//!     .get("/hello/:name", |req, res, _next| {
//!         let name = req.params.get("name").cloned().unwrap_or_default();
//!         res.status(200).json(serde_json::json!({ "hello": name }));
//!         Ok(())
//!     })
//!     .expect("valid route pattern");
//! let registry = table.freeze();
//! let config = Arc::new(ServerConfig::default());
//!
//! // One dispatcher per incoming request.
//! let dispatcher = RequestDispatcher::new(
//!     &registry,
//!     Request::new(Method::GET, "/hello/world"),
//!     Response::new(),
//!     Arc::clone(&config),
//! );
//! let (_request, response) = dispatcher.run();
//! assert_eq!(response.status_code(), 200);
//! ```

pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod route;
pub mod router;
pub mod server;
pub mod static_files;

pub use dispatcher::{HttpError, Next, RequestDispatcher};
pub use error::ConfigError;
pub use route::{Handler, Route, RouteMethod, RouteOptions, SubdomainPattern};
pub use router::{RouteRegistry, RouteTable};
pub use server::{ColorScheme, Request, Response, SendFileOptions, ServerConfig};
pub use static_files::{DotfilesPolicy, StaticFiles, StaticOptions};
