use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatcher::Next;
use crate::route::{PathPattern, Route, RouteMethod};
use crate::server::{CookiePriority, Request, Response, ServerConfig};

/// Name of the persistent language cookie.
pub const LANGUAGE_COOKIE: &str = "language";

/// Query parameter that forces a language and triggers a cleaning redirect.
pub const LANGUAGE_QUERY_PARAM: &str = "lang";

/// Build the locale negotiation route.
///
/// Always prepended to every request's chain. Resolution order:
///
/// 1. the logged-in user's stored language preference, if supported;
/// 2. an explicit `?lang=` query parameter, if supported - this also sets a
///    persistent `language` cookie and redirects to the same URL with
///    `lang` stripped, ending the chain without proceeding;
/// 3. the `language` cookie, if its value is supported;
/// 4. the `Accept-Language` primary tag, if supported;
/// 5. the server default language.
#[must_use]
pub fn locale_route(config: Arc<ServerConfig>) -> Route {
    Route::new(
        RouteMethod::Use,
        PathPattern::match_all(),
        Arc::new(move |req, res, next| {
            negotiate(&config, req, res, next);
            Ok(())
        }),
    )
}

fn negotiate(config: &ServerConfig, req: &mut Request, res: &mut Response, next: &mut Next) {
    if req.user.logged_in {
        if let Some(preferred) = req.user.preferences.language.clone() {
            if config.supports(&preferred) {
                debug!(language = %preferred, source = "user_preference", "Language resolved");
                apply(req, preferred);
                next.proceed();
                return;
            }
        }
    }

    if let Some(requested) = req.query.get(LANGUAGE_QUERY_PARAM).cloned() {
        if config.supports(&requested) {
            res.cookies()
                .create(LANGUAGE_COOKIE, &requested, CookiePriority::High);
            let target = req.href_excluding(Some(LANGUAGE_QUERY_PARAM));
            info!(
                language = %requested,
                redirect = %target,
                "Language override via query parameter"
            );
            // The redirect ends this request; the chain does not continue.
            res.redirect(target);
            return;
        }
    }

    if let Some(cookie) = req.cookies.get(LANGUAGE_COOKIE).cloned() {
        if config.supports(&cookie) {
            debug!(language = %cookie, source = "cookie", "Language resolved");
            apply(req, cookie);
            next.proceed();
            return;
        }
    }

    if let Some(header) = req.headers.get("accept-language").cloned() {
        for candidate in accept_language_candidates(&header) {
            if config.supports(&candidate) {
                debug!(language = %candidate, source = "accept_language", "Language resolved");
                apply(req, candidate);
                next.proceed();
                return;
            }
        }
    }

    let fallback = config.default_language().to_string();
    debug!(language = %fallback, source = "default", "Language resolved");
    apply(req, fallback);
    next.proceed();
}

fn apply(req: &mut Request, language: String) {
    req.set_locale(language.clone());
    req.set_language(language);
}

/// Candidates derived from an `Accept-Language` header's primary tag.
///
/// Only the first entry is considered (the primary tag); quality weights on
/// it are stripped, and both the full tag and its primary subtag are
/// offered (`fr-CA` yields `fr-ca` then `fr`).
fn accept_language_candidates(header: &str) -> Vec<String> {
    let primary = header
        .split(',')
        .next()
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if primary.is_empty() || primary == "*" {
        return Vec::new();
    }
    let mut candidates = vec![primary.clone()];
    if let Some(subtag) = primary.split('-').next() {
        if subtag != primary {
            candidates.push(subtag.to_string());
        }
    }
    candidates
}
