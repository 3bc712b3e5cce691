//! # Server Module
//!
//! Narrow interfaces between the dispatch core and its collaborators:
//!
//! - [`Request`] - the normalized request object the transport layer
//!   produces from a raw HTTP request (method, path segments, query,
//!   cookies, headers, body, user context).
//! - [`Response`] - a buffered response the handlers write into: status,
//!   headers, JSON/bytes/file body, redirects, cookie changes, and the
//!   canned framework pages. The transport layer serializes it.
//! - [`ServerConfig`] - language negotiation settings plus the optional
//!   session/logger/error hooks the dispatcher wires in as cross-cutting
//!   routes.
//!
//! Everything beyond these interfaces (connection handling, TLS, wire
//! parsing) lives outside this crate.

mod config;
mod request;
mod response;

pub use config::{ErrorHandler, ServerConfig};
pub use request::{
    parse_cookies, parse_path_segments, parse_query_params, ColorScheme, Request, UserContext,
    UserPreferences,
};
pub use response::{
    Body, CookieChange, CookiePriority, Cookies, HeaderVec, Pages, Response, SendFileOptions,
    Sender, MAX_INLINE_HEADERS,
};
