//! Dispatcher core module - per-request continuation-driven dispatch.

use std::panic;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::middleware::{color_scheme_route, locale_route};
use crate::route::{Handler, PathPattern, Route, RouteMethod, RouteOptions};
use crate::router::RouteRegistry;
use crate::server::{Request, Response, ServerConfig};

/// Continuation token handed to every handler.
///
/// Calling [`Next::proceed`] asks the dispatcher to advance to the next
/// route in the chain once the current handler returns. A handler that
/// neither proceeds nor sends a response ends the chain (and, if nothing
/// was sent, the request hangs - that is the caller's responsibility, not
/// guarded here).
#[derive(Debug)]
pub struct Next {
    advance: bool,
}

impl Next {
    pub(crate) fn new() -> Self {
        Self { advance: false }
    }

    /// Yield control to the next route in the chain.
    ///
    /// Takes effect once per handler invocation; calling it repeatedly is
    /// the same as calling it once.
    pub fn proceed(&mut self) {
        self.advance = true;
    }

    pub(crate) fn requested(&self) -> bool {
        self.advance
    }
}

/// Structured record of a handler failure.
///
/// Captured by the dispatcher when a handler returns an error or panics,
/// and handed to the configured error callback (or rendered on the generic
/// 500 page).
#[derive(Debug, Clone, Serialize)]
pub struct HttpError {
    /// Human-readable description of the failure
    pub message: String,
    /// Stringified original error or panic payload
    pub error: String,
    /// Serialized summary of the request being dispatched
    pub request: Value,
    /// Path pattern of the offending route
    pub route: String,
}

fn panic_payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Wrap a configured hook (session, logger) as a cross-cutting USE route.
fn hook_route(handler: Handler) -> Route {
    Route::new(RouteMethod::Use, PathPattern::match_all(), handler)
}

/// Per-request dispatch state machine.
///
/// Instantiated once per incoming request and discarded afterwards. Owns
/// the request/response pair and a private route list seeded from the
/// registry (pre-filtered by subdomain) with the framework's cross-cutting
/// routes prepended in fixed order: session (if configured), locale
/// negotiation, color-scheme negotiation, logger (if configured).
///
/// Execution is strictly sequential: one handler at a time, each yielding
/// forward via [`Next::proceed`]. The route list can grow during dispatch -
/// a failing handler gets a one-shot recovery route spliced in right after
/// it - but it is never shared with another request, so no locking is
/// involved anywhere on this path.
pub struct RequestDispatcher {
    routes: Vec<Arc<Route>>,
    /// Index of the next route to try (the source system's `currentIndex`
    /// cursor, without the -1 sentinel)
    next_index: usize,
    request: Request,
    response: Response,
    config: Arc<ServerConfig>,
}

impl RequestDispatcher {
    /// Seed a dispatcher for one request.
    ///
    /// Snapshots the registry filtered by subdomain so middleware hops do
    /// not re-test subdomains, then prepends the cross-cutting routes.
    #[must_use]
    pub fn new(
        registry: &RouteRegistry,
        request: Request,
        response: Response,
        config: Arc<ServerConfig>,
    ) -> Self {
        let mut routes: Vec<Arc<Route>> = Vec::with_capacity(registry.len() + 4);
        if let Some(handler) = config.user_sessions() {
            routes.push(Arc::new(hook_route(handler)));
        }
        routes.push(Arc::new(locale_route(Arc::clone(&config))));
        routes.push(Arc::new(color_scheme_route()));
        if let Some(handler) = config.logger() {
            routes.push(Arc::new(hook_route(handler)));
        }
        routes.extend(
            registry
                .routes()
                .iter()
                .filter(|route| route.subdomain_could_match(&request))
                .map(Arc::clone),
        );

        Self {
            routes,
            next_index: 0,
            request,
            response,
            config,
        }
    }

    /// Drive the chain to completion.
    ///
    /// Runs until a handler finishes without proceeding, or the chain is
    /// exhausted (which renders the canned not-found page when nothing was
    /// sent). Completion is observed through the returned response's state,
    /// not a return value from the handlers.
    pub fn run(mut self) -> (Request, Response) {
        info!(
            method = %self.request.method,
            href = %self.request.href(),
            route_count = self.routes.len(),
            "Dispatch start"
        );
        self.advance();
        (self.request, self.response)
    }

    /// The advance loop: the `next()` state transition, expressed as an
    /// explicit index machine over the growable route list.
    fn advance(&mut self) {
        loop {
            let Some(route) = self.routes.get(self.next_index).map(Arc::clone) else {
                // Chain exhausted without a terminal handler.
                if !self.response.is_sent() {
                    info!(href = %self.request.href(), "Route chain exhausted");
                    self.response.pages().not_found();
                }
                return;
            };
            self.next_index += 1;

            let Some(params) = route.matches(&self.request) else {
                continue;
            };
            // Match output is copied into the request; an empty match
            // resets any params left over from an earlier route.
            self.request.params = params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();

            let mut next = Next::new();
            let handler = route.handler().as_ref();
            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                handler(&mut self.request, &mut self.response, &mut next)
            }));

            match outcome {
                Ok(Ok(())) => {
                    if next.requested() {
                        continue;
                    }
                    debug!(
                        route = %route.path().as_str(),
                        status = self.response.status_code(),
                        "Dispatch complete"
                    );
                    return;
                }
                Ok(Err(err)) => {
                    self.splice_recovery_route(&route, err.to_string());
                }
                Err(payload) => {
                    self.splice_recovery_route(&route, panic_payload_message(payload.as_ref()));
                }
            }
            // The failing handler's turn is over; the next advance lands on
            // the recovery route spliced at `next_index`.
        }
    }

    /// Synthesize a one-shot recovery route and splice it immediately after
    /// the failing route.
    ///
    /// The recovery route is method USE, bound to the same path as the
    /// offender, and delegates to the configured error callback - or the
    /// generic 500 page when no callback is registered or the callback
    /// itself fails. The backstop path only writes to the buffered response
    /// and cannot fail.
    fn splice_recovery_route(&mut self, offender: &Route, detail: String) {
        let record = HttpError {
            message: format!(
                "handler for `{}` failed while processing the request",
                offender.path().as_str()
            ),
            error: detail,
            request: self.request.summary(),
            route: offender.path().as_str().to_string(),
        };
        error!(
            route = %record.route,
            error = %record.error,
            href = %self.request.href(),
            "Handler failure recovered"
        );

        let callback = self.config.on_http_error();
        let handler: Handler = Arc::new(move |req, res, _next| {
            if let Some(cb) = &callback {
                let cb = cb.as_ref();
                let outcome =
                    panic::catch_unwind(panic::AssertUnwindSafe(|| cb(&record, req, res)));
                match outcome {
                    Ok(Ok(())) => return Ok(()),
                    Ok(Err(err)) => {
                        warn!(error = %err, "onHTTPError callback failed, falling back to generic 500");
                    }
                    Err(_) => {
                        warn!("onHTTPError callback panicked, falling back to generic 500");
                    }
                }
            }
            res.pages().server_error(&record);
            Ok(())
        });

        let recovery = Route::with_options(
            RouteMethod::Use,
            offender.path().clone(),
            handler,
            RouteOptions {
                case_sensitive: offender.case_sensitive(),
                ..RouteOptions::default()
            },
        );
        self.routes.insert(self.next_index, Arc::new(recovery));
    }
}
