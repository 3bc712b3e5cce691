//! Tests for static file resolution
//!
//! # Test Coverage
//!
//! - Serving files under a mount, including nested paths
//! - Fall-through to later routes on misses
//! - Traversal containment: `..` segments and paths escaping the root
//! - Dotfiles policy (allow / ignore / deny)
//! - Case-sensitivity of the final-segment lookup
//! - `eTags.json` manifest handling, including the malformed-manifest 500
//!
//! # Test Strategy
//!
//! Each test builds a throwaway directory tree with `tempfile`, mounts it at
//! `/assets`, and appends a catch-all marker route answering 410 so a
//! fall-through is distinguishable from a served file or an error page.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use gantry::server::Body;
use gantry::{
    DotfilesPolicy, Request, RequestDispatcher, Response, RouteTable, ServerConfig, StaticOptions,
};
use http::Method;

use tracing_util::TestTracing;

/// Status the trailing marker route answers with when the static route
/// falls through.
const FELL_THROUGH: u16 = 410;

fn write_fixture_tree(root: &Path) {
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("app.css"), "body { margin: 0 }").unwrap();
    fs::write(root.join("index.html"), "<html></html>").unwrap();
    fs::write(root.join(".env"), "SECRET=1").unwrap();
    fs::write(root.join("sub").join("page.html"), "<p>nested</p>").unwrap();
}

fn dispatch_static(root: &Path, options: StaticOptions, target: &str) -> Response {
    let mut table = RouteTable::new();
    table.static_mount("/assets", root, options).unwrap();
    table
        .get("*", |_req, res, _next| {
            res.status(FELL_THROUGH).end(Vec::new());
            Ok(())
        })
        .unwrap();
    let registry = table.freeze();

    let (_req, res) = RequestDispatcher::new(
        &registry,
        Request::new(Method::GET, target),
        Response::new(),
        Arc::new(ServerConfig::default()),
    )
    .run();
    res
}

fn served_path(res: &Response) -> &Path {
    match res.body() {
        Body::File(path) => path,
        other => panic!("expected a file body, got {other:?}"),
    }
}

#[test]
fn test_serves_file_under_mount() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/app.css");
    assert_eq!(res.status_code(), 200);
    assert!(served_path(&res).ends_with("app.css"));
    assert_eq!(res.get_header("content-type"), Some("text/css"));
    assert_eq!(
        res.get_header("cache-control"),
        Some("public, max-age=3600")
    );
    assert_eq!(res.get_header("accept-ranges"), Some("bytes"));
    assert!(res.get_header("last-modified").is_some());
}

#[test]
fn test_serves_nested_file() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/sub/page.html");
    assert_eq!(res.status_code(), 200);
    assert!(served_path(&res).ends_with("page.html"));
    assert_eq!(res.get_header("content-type"), Some("text/html"));
}

#[test]
fn test_missing_file_falls_through() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/nope.css");
    assert_eq!(res.status_code(), FELL_THROUGH);
}

#[test]
fn test_directory_is_not_served() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    // `sub` exists but is a directory; only regular files are served.
    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/sub");
    assert_eq!(res.status_code(), FELL_THROUGH);
}

#[test]
fn test_traversal_segments_cannot_escape_root() {
    let _tracing = TestTracing::init();
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("public");
    fs::create_dir(&root).unwrap();
    write_fixture_tree(&root);
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();

    // Allow dotfiles so the `..` segment reaches the component check instead
    // of the dotfile policy.
    let options = StaticOptions {
        dotfiles: DotfilesPolicy::Allow,
        ..StaticOptions::default()
    };
    let res = dispatch_static(&root, options, "/assets/../secret.txt");
    assert_eq!(res.status_code(), FELL_THROUGH);

    let res = dispatch_static(&root, options, "/assets/sub/../../secret.txt");
    assert_eq!(res.status_code(), FELL_THROUGH);
}

#[test]
fn test_dotfiles_ignored_by_default() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/.env");
    assert_eq!(res.status_code(), FELL_THROUGH);
}

#[test]
fn test_dotfiles_denied_renders_unauthorized() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let options = StaticOptions {
        dotfiles: DotfilesPolicy::Deny,
        ..StaticOptions::default()
    };
    let res = dispatch_static(dir.path(), options, "/assets/.env");
    assert_eq!(res.status_code(), 401);
}

#[test]
fn test_dotfiles_allowed_are_served() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let options = StaticOptions {
        dotfiles: DotfilesPolicy::Allow,
        ..StaticOptions::default()
    };
    let res = dispatch_static(dir.path(), options, "/assets/.env");
    assert_eq!(res.status_code(), 200);
    assert!(served_path(&res).ends_with(".env"));
}

#[test]
fn test_lookup_is_case_insensitive_by_default() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/APP.CSS");
    assert_eq!(res.status_code(), 200);
    assert!(served_path(&res).ends_with("app.css"));

    let options = StaticOptions {
        case_sensitive: true,
        ..StaticOptions::default()
    };
    let res = dispatch_static(dir.path(), options, "/assets/APP.CSS");
    assert_eq!(res.status_code(), FELL_THROUGH);
}

#[test]
fn test_etag_manifest_sets_header() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());
    fs::write(
        dir.path().join("eTags.json"),
        r#"{ "app.css": "\"abc123\"" }"#,
    )
    .unwrap();

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/app.css");
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.get_header("etag"), Some("\"abc123\""));

    // A file missing from the manifest gets no ETag.
    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/index.html");
    assert_eq!(res.status_code(), 200);
    assert!(res.get_header("etag").is_none());
}

#[test]
fn test_malformed_manifest_is_a_server_error() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());
    fs::write(dir.path().join("eTags.json"), "{ not json").unwrap();

    let res = dispatch_static(dir.path(), StaticOptions::default(), "/assets/app.css");
    assert_eq!(res.status_code(), 500);
    assert!(matches!(res.body(), Body::Json(_)));
}

#[test]
fn test_custom_max_age_propagates_to_cache_control() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let options = StaticOptions {
        max_age_secs: 86400,
        ..StaticOptions::default()
    };
    let res = dispatch_static(dir.path(), options, "/assets/app.css");
    assert_eq!(
        res.get_header("cache-control"),
        Some("public, max-age=86400")
    );
}

#[test]
fn test_root_mount_with_empty_relative_path_falls_through() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    write_fixture_tree(dir.path());

    let mut table = RouteTable::new();
    table
        .static_mount("/", dir.path(), StaticOptions::default())
        .unwrap();
    table
        .get("*", |_req, res, _next| {
            res.status(FELL_THROUGH).end(Vec::new());
            Ok(())
        })
        .unwrap();
    let registry = table.freeze();

    let (_req, res) = RequestDispatcher::new(
        &registry,
        Request::new(Method::GET, "/"),
        Response::new(),
        Arc::new(ServerConfig::default()),
    )
    .run();
    assert_eq!(res.status_code(), FELL_THROUGH);

    let (_req, res) = RequestDispatcher::new(
        &registry,
        Request::new(Method::GET, "/index.html"),
        Response::new(),
        Arc::new(ServerConfig::default()),
    )
    .run();
    assert_eq!(res.status_code(), 200);
}
