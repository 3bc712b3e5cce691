//! # Route Module
//!
//! A [`Route`] is the leaf of the dispatch core: an immutable matcher bound
//! to a handler function. The matcher covers four dimensions:
//!
//! - **Method**: one of the HTTP verbs, or the `USE` pseudo-method that
//!   accepts any verb (used for cross-cutting middleware).
//! - **Path pattern**: ordered segments that are literals, `:name`
//!   parameters, or a trailing `*` wildcard. The bare pattern `*` matches
//!   every path.
//! - **Subdomain pattern**: a literal subdomain or `*`.
//! - **Case rule**: literal and subdomain comparison is case-insensitive
//!   unless the route opts in to case sensitivity.
//!
//! Matching is deterministic and side-effect-free. A successful match
//! produces a [`ParamVec`] of bound parameters; the per-request dispatcher
//! copies it into the request object, so no match output is ever shared
//! between concurrent requests hitting the same route.

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    Handler, ParamVec, PathPattern, PathSegment, Route, RouteMethod, RouteOptions,
    SubdomainPattern, MAX_INLINE_PARAMS,
};
