//! # Router Module
//!
//! Registration-time construction of the server's route collection.
//!
//! [`RouteTable`] is the builder the application uses during startup: one
//! convenience method per HTTP verb (plus `use_` for cross-cutting routes),
//! a `static_mount` helper that wires a validated [`crate::static_files::StaticFiles`]
//! resolver into the table, and a `favicon` helper for the dedicated
//! `/favicon.ico` route. Every helper validates its input immediately and
//! returns a [`crate::error::ConfigError`] on bad configuration - request
//! time never sees an invalid route.
//!
//! Once startup is complete the table is frozen into a [`RouteRegistry`]:
//! an append-only collection that becomes effectively immutable, shared by
//! reference with the per-request dispatchers. Mutating routes while
//! requests are in flight is not supported; freeze first, then serve.

mod core;

pub use core::{RouteRegistry, RouteTable};
