//! # Middleware Module
//!
//! Framework cross-cutting routes the dispatcher prepends to every
//! request's chain. Each is an ordinary USE route bound to the `*` path:
//!
//! - [`locale_route`] - language negotiation (user preference, `?lang=`
//!   override with cleaning redirect, cookie, `Accept-Language`, default).
//! - [`color_scheme_route`] - `color-scheme` cookie normalization.
//!
//! Session and logger middleware come from the server configuration as
//! opaque handlers; the dispatcher wraps them into USE routes itself.

mod color_scheme;
mod locale;

pub use color_scheme::{color_scheme_route, COLOR_SCHEME_COOKIE};
pub use locale::{locale_route, LANGUAGE_COOKIE, LANGUAGE_QUERY_PARAM};
