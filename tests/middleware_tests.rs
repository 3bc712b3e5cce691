//! Tests for the framework's cross-cutting routes
//!
//! # Test Coverage
//!
//! Locale negotiation precedence:
//! - Logged-in user preference beats everything else
//! - `?lang=` override sets the cookie and redirects with `lang` stripped
//! - `language` cookie, then `Accept-Language`, then the server default
//! - Unsupported values at each stage fall through to the next source
//!
//! Color-scheme normalization:
//! - A valid `color-scheme` cookie is parsed into the request
//! - Missing or invalid cookies reset to `Default` with a `Medium` cookie
//!
//! # Test Strategy
//!
//! Each test dispatches one request through a registry holding a single
//! terminal route and inspects the returned request/response pair; the
//! cross-cutting routes are prepended by the dispatcher itself.

use std::sync::Arc;

use gantry::middleware::{COLOR_SCHEME_COOKIE, LANGUAGE_COOKIE};
use gantry::server::CookiePriority;
use gantry::{
    ColorScheme, Request, RequestDispatcher, Response, RouteTable, ServerConfig,
};
use http::Method;

use tracing_util::TestTracing;

fn en_fr_config() -> Arc<ServerConfig> {
    Arc::new(ServerConfig::new(vec!["en".to_string(), "fr".to_string()], "en").unwrap())
}

fn dispatch(config: Arc<ServerConfig>, request: Request) -> (Request, Response) {
    let mut table = RouteTable::new();
    table
        .use_("*", |_req, res, _next| {
            res.status(200).end(Vec::new());
            Ok(())
        })
        .unwrap();
    let registry = table.freeze();
    RequestDispatcher::new(&registry, request, Response::new(), config).run()
}

#[test]
fn test_default_language_applied() {
    let _tracing = TestTracing::init();
    let (req, res) = dispatch(en_fr_config(), Request::new(Method::GET, "/"));
    assert_eq!(res.status_code(), 200);
    assert_eq!(req.language(), Some("en"));
    assert_eq!(req.locale(), Some("en"));
}

#[test]
fn test_language_cookie_wins_over_default() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request
        .cookies
        .insert(LANGUAGE_COOKIE.to_string(), "fr".to_string());

    let (req, res) = dispatch(en_fr_config(), request);
    assert_eq!(res.status_code(), 200);
    assert_eq!(req.language(), Some("fr"));
    assert!(res.redirect_target().is_none());
}

#[test]
fn test_unsupported_cookie_falls_back_to_default() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request
        .cookies
        .insert(LANGUAGE_COOKIE.to_string(), "de".to_string());

    let (req, _res) = dispatch(en_fr_config(), request);
    assert_eq!(req.language(), Some("en"));
}

#[test]
fn test_query_override_redirects_with_lang_stripped() {
    let _tracing = TestTracing::init();
    let request = Request::new(Method::GET, "/docs/intro?lang=fr&page=2");

    let (_req, res) = dispatch(en_fr_config(), request);
    assert_eq!(res.status_code(), 302);
    assert_eq!(res.redirect_target(), Some("/docs/intro?page=2"));

    let change = res
        .cookie_changes()
        .iter()
        .find(|c| c.name == LANGUAGE_COOKIE)
        .expect("language cookie recorded");
    assert_eq!(change.value, "fr");
    assert_eq!(change.priority, CookiePriority::High);
}

#[test]
fn test_query_override_with_no_other_params() {
    let _tracing = TestTracing::init();
    let (_req, res) = dispatch(en_fr_config(), Request::new(Method::GET, "/docs?lang=fr"));
    assert_eq!(res.status_code(), 302);
    assert_eq!(res.redirect_target(), Some("/docs"));
}

#[test]
fn test_unsupported_query_override_is_ignored() {
    let _tracing = TestTracing::init();
    let (req, res) = dispatch(en_fr_config(), Request::new(Method::GET, "/docs?lang=xx"));
    // No redirect; negotiation continues to the default.
    assert_eq!(res.status_code(), 200);
    assert_eq!(req.language(), Some("en"));
    assert!(res
        .cookie_changes()
        .iter()
        .all(|c| c.name != LANGUAGE_COOKIE));
}

#[test]
fn test_accept_language_header_negotiated() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request.headers.insert(
        "accept-language".to_string(),
        "fr-CA,fr;q=0.9,en;q=0.8".to_string(),
    );

    // `fr-ca` itself is unsupported; the primary subtag `fr` is.
    let (req, _res) = dispatch(en_fr_config(), request);
    assert_eq!(req.language(), Some("fr"));
}

#[test]
fn test_user_preference_wins_over_cookie() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request.user.logged_in = true;
    request.user.preferences.language = Some("fr".to_string());
    request
        .cookies
        .insert(LANGUAGE_COOKIE.to_string(), "en".to_string());

    let (req, _res) = dispatch(en_fr_config(), request);
    assert_eq!(req.language(), Some("fr"));
}

#[test]
fn test_unsupported_user_preference_falls_through() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request.user.logged_in = true;
    request.user.preferences.language = Some("de".to_string());
    request
        .cookies
        .insert(LANGUAGE_COOKIE.to_string(), "fr".to_string());

    let (req, _res) = dispatch(en_fr_config(), request);
    assert_eq!(req.language(), Some("fr"));
}

#[test]
fn test_color_scheme_cookie_parsed() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    request
        .cookies
        .insert(COLOR_SCHEME_COOKIE.to_string(), "Dark".to_string());

    let (req, res) = dispatch(en_fr_config(), request);
    assert_eq!(req.color_scheme(), ColorScheme::Dark);
    assert!(res
        .cookie_changes()
        .iter()
        .all(|c| c.name != COLOR_SCHEME_COOKIE));
}

#[test]
fn test_missing_color_scheme_cookie_reset() {
    let _tracing = TestTracing::init();
    let (req, res) = dispatch(en_fr_config(), Request::new(Method::GET, "/"));
    assert_eq!(req.color_scheme(), ColorScheme::Default);

    let change = res
        .cookie_changes()
        .iter()
        .find(|c| c.name == COLOR_SCHEME_COOKIE)
        .expect("reset cookie recorded");
    assert_eq!(change.value, "Default");
    assert_eq!(change.priority, CookiePriority::Medium);
}

#[test]
fn test_invalid_color_scheme_cookie_reset() {
    let _tracing = TestTracing::init();
    let mut request = Request::new(Method::GET, "/");
    // Cookie values are exact-case; lowercase does not parse.
    request
        .cookies
        .insert(COLOR_SCHEME_COOKIE.to_string(), "dark".to_string());

    let (req, res) = dispatch(en_fr_config(), request);
    assert_eq!(req.color_scheme(), ColorScheme::Default);
    assert!(res
        .cookie_changes()
        .iter()
        .any(|c| c.name == COLOR_SCHEME_COOKIE && c.value == "Default"));
}
