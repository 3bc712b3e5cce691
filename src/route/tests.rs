use std::sync::Arc;

use http::Method;

use super::*;
use crate::error::ConfigError;
use crate::server::Request;

fn noop_handler() -> Handler {
    Arc::new(|_req, _res, next| {
        next.proceed();
        Ok(())
    })
}

#[test]
fn test_parse_rejects_mid_pattern_wildcard() {
    let err = PathPattern::parse("/a/*/b");
    assert!(matches!(err, Err(ConfigError::InvalidPathPattern { .. })));
}

#[test]
fn test_parse_rejects_unnamed_param() {
    let err = PathPattern::parse("/a/:/b");
    assert!(matches!(err, Err(ConfigError::InvalidPathPattern { .. })));
}

#[test]
fn test_root_pattern_matches_root_only() {
    let pattern = PathPattern::parse("/").unwrap();
    assert!(pattern.matches(&[], false).is_some());
    assert!(pattern.matches(&["a".to_string()], false).is_none());
}

#[test]
fn test_trailing_slash_normalization() {
    let pattern = PathPattern::parse("/users/:id/").unwrap();
    let path = vec!["users".to_string(), "7".to_string()];
    let params = pattern.matches(&path, false).unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0.as_ref(), "id");
    assert_eq!(params[0].1, "7");
}

#[test]
fn test_wildcard_requires_trailing_segment() {
    let pattern = PathPattern::parse("/assets/*").unwrap();
    assert!(pattern.matches(&["assets".to_string()], false).is_none());
    assert!(pattern
        .matches(&["assets".to_string(), "app.css".to_string()], false)
        .is_some());
    assert!(pattern
        .matches(
            &[
                "assets".to_string(),
                "img".to_string(),
                "logo.png".to_string()
            ],
            false
        )
        .is_some());
}

#[test]
fn test_match_all_matches_everything() {
    let pattern = PathPattern::match_all();
    assert!(pattern.matches(&[], true).is_some());
    assert!(pattern
        .matches(&["deep".to_string(), "path".to_string()], true)
        .is_some());
}

#[test]
fn test_literal_case_rule() {
    let pattern = PathPattern::parse("/Docs").unwrap();
    let path = vec!["docs".to_string()];
    assert!(pattern.matches(&path, false).is_some());
    assert!(pattern.matches(&path, true).is_none());
}

#[test]
fn test_matching_is_idempotent() {
    let pattern = PathPattern::parse("/users/:id/posts/:post").unwrap();
    let path = vec![
        "users".to_string(),
        "1".to_string(),
        "posts".to_string(),
        "2".to_string(),
    ];
    let first = pattern.matches(&path, false).unwrap();
    let second = pattern.matches(&path, false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_use_method_accepts_everything() {
    for method in [Method::GET, Method::POST, Method::DELETE, Method::TRACE] {
        assert!(RouteMethod::Use.accepts(&method));
    }
    assert!(RouteMethod::Get.accepts(&Method::GET));
    assert!(!RouteMethod::Get.accepts(&Method::POST));
}

#[test]
fn test_subdomain_wildcard_matches_any_including_none() {
    assert!(SubdomainPattern::Any.matches(None, false));
    assert!(SubdomainPattern::Any.matches(Some("api"), true));
    assert!(SubdomainPattern::parse("*").matches(Some("anything"), true));
}

#[test]
fn test_subdomain_literal_case_rule() {
    let pattern = SubdomainPattern::parse("API");
    assert!(pattern.matches(Some("api"), false));
    assert!(!pattern.matches(Some("api"), true));
    assert!(!pattern.matches(None, false));
}

#[test]
fn test_route_match_populates_request_scoped_params() {
    let route = Route::new(
        RouteMethod::Get,
        PathPattern::parse("/users/:id").unwrap(),
        noop_handler(),
    );
    let req = Request::new(Method::GET, "/users/42");
    let params = route.matches(&req).unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].1, "42");

    let miss = Request::new(Method::POST, "/users/42");
    assert!(route.matches(&miss).is_none());
}

#[test]
fn test_route_subdomain_prefilter() {
    let route = Route::with_options(
        RouteMethod::Get,
        PathPattern::parse("/").unwrap(),
        noop_handler(),
        RouteOptions {
            subdomain: SubdomainPattern::parse("admin"),
            case_sensitive: false,
        },
    );
    let mut req = Request::new(Method::GET, "/");
    assert!(!route.subdomain_could_match(&req));
    req.subdomain = Some("Admin".to_string());
    assert!(route.subdomain_could_match(&req));
    assert!(route.matches(&req).is_some());
}
