//! # Dispatcher Module
//!
//! The dispatcher is the per-request state machine at the center of the
//! framework. For every incoming request it:
//!
//! - snapshots the subset of registered routes whose subdomain could match,
//! - prepends the framework's cross-cutting routes (session, locale
//!   negotiation, color scheme, logger) in fixed order,
//! - runs matching handlers in sequence, each yielding forward through the
//!   [`Next`] continuation,
//! - recovers from handler failures by splicing a one-shot recovery route
//!   into the chain instead of letting the failure propagate,
//! - and renders the canned not-found page when the chain is exhausted
//!   without a response.
//!
//! ## Failure recovery
//!
//! A handler fails by returning `Err` or panicking during its synchronous
//! extent. The dispatcher captures the failure as an [`HttpError`] record
//! and synthesizes a recovery route (method USE, same path as the offender)
//! spliced immediately after the failing route, so the very next advance
//! reaches it. The recovery route delegates to the server's `on_http_error`
//! callback when one is registered, falling back to the generic 500 page -
//! including when the callback itself fails. A handler failure therefore
//! never crashes the dispatcher or the process.
//!
//! Failures deferred past a handler's return (background work failing after
//! the handler yielded) are not captured by this mechanism; matching the
//! source system, only the synchronous extent is guarded.
//!
//! ## Ownership
//!
//! Each dispatcher exclusively owns its request, response, and route list
//! for the lifetime of one dispatch. Nothing is shared between in-flight
//! requests, so the whole path is lock-free by construction.

mod core;

pub use core::{HttpError, Next, RequestDispatcher};
