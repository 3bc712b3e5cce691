use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::dispatcher::HttpError;

/// Maximum inline response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` because they are usually repeated literals
/// (Content-Type, Cache-Control, ...) and `Arc::from` on a `&'static str` is
/// cheap; values are per-response data and stay `String`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Guess a Content-Type from a file extension.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "ico" => "image/x-icon",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Buffered response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// JSON document (serialized by the transport layer)
    Json(Value),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// File to be streamed from disk by the transport layer
    File(PathBuf),
}

/// Priority hint recorded with a cookie change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

/// A cookie the response wants the client to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieChange {
    pub name: String,
    pub value: String,
    pub priority: CookiePriority,
}

/// Options for [`Sender::send_file`].
#[derive(Debug, Clone, Copy)]
pub struct SendFileOptions {
    /// `Cache-Control: public, max-age=N` value in seconds
    pub max_age_secs: u32,
}

impl Default for SendFileOptions {
    fn default() -> Self {
        Self { max_age_secs: 3600 }
    }
}

/// Buffered response object handed to route handlers.
///
/// The dispatch core only records what should be sent - status, headers,
/// body (possibly a file path), redirect target, and cookie changes. The
/// transport layer (out of scope) serializes it onto the wire. The first
/// send wins: once `sent` is set, later sends and redirects are ignored, so
/// a recovery route can never clobber a response a handler already produced.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Body,
    redirect_to: Option<String>,
    cookie_changes: Vec<CookieChange>,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Create an empty, unsent response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Body::Empty,
            redirect_to: None,
            cookie_changes: Vec::new(),
            sent: false,
        }
    }

    /// Add or replace a header (name comparison is case-insensitive).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a terminal send (or redirect) has happened.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// The recorded status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Reason phrase for the recorded status code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }

    /// The recorded body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Where the response redirects to, if anywhere.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    /// Cookie changes recorded so far.
    #[must_use]
    pub fn cookie_changes(&self) -> &[CookieChange] {
        &self.cookie_changes
    }

    /// Issue a 302 redirect. Terminal; ignored if already sent.
    pub fn redirect(&mut self, url: impl Into<String>) {
        if self.sent {
            return;
        }
        let url = url.into();
        debug!(location = %url, "Redirect issued");
        self.status = 302;
        self.set_header("Location", url.clone());
        self.redirect_to = Some(url);
        self.sent = true;
    }

    /// Begin a send with the given status code.
    pub fn status(&mut self, code: u16) -> Sender<'_> {
        Sender {
            response: self,
            status: code,
        }
    }

    /// Canned framework pages.
    pub fn pages(&mut self) -> Pages<'_> {
        Pages { response: self }
    }

    /// Cookie recording surface.
    pub fn cookies(&mut self) -> Cookies<'_> {
        Cookies { response: self }
    }

    fn commit(&mut self, status: u16, body: Body) {
        if self.sent {
            return;
        }
        self.status = status;
        self.body = body;
        self.sent = true;
    }
}

/// In-flight send started by [`Response::status`].
pub struct Sender<'a> {
    response: &'a mut Response,
    status: u16,
}

impl Sender<'_> {
    /// Send a JSON body.
    pub fn json(self, body: Value) {
        if !self.response.sent {
            self.response
                .set_header("Content-Type", "application/json");
        }
        self.response.commit(self.status, Body::Json(body));
    }

    /// Send raw bytes.
    pub fn end(self, data: Vec<u8>) {
        self.response.commit(self.status, Body::Bytes(data));
    }

    /// Send a file from disk with cache-validation headers.
    ///
    /// Sets `Content-Type` (by extension), `Last-Modified`, `Accept-Ranges`,
    /// and `Cache-Control`. Fails if the path cannot be stat'ed or is not a
    /// regular file; the caller decides whether that is a soft miss or an
    /// error.
    pub fn send_file(self, path: &Path, options: SendFileOptions) -> io::Result<()> {
        if self.response.sent {
            return Ok(());
        }
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "not a regular file",
            ));
        }
        self.response
            .set_header("Content-Type", content_type_for(path));
        if let Ok(modified) = metadata.modified() {
            let when: DateTime<Utc> = modified.into();
            self.response.set_header(
                "Last-Modified",
                when.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            );
        }
        self.response.set_header("Accept-Ranges", "bytes");
        self.response.set_header(
            "Cache-Control",
            format!("public, max-age={}", options.max_age_secs),
        );
        debug!(path = %path.display(), size = metadata.len(), "File send recorded");
        self.response
            .commit(self.status, Body::File(path.to_path_buf()));
        Ok(())
    }
}

/// Canned error/info pages.
///
/// These are deliberately infallible: the dispatcher leans on them as the
/// last line of failure handling, so they only write to the buffered
/// response and never touch the filesystem.
pub struct Pages<'a> {
    response: &'a mut Response,
}

impl Pages<'_> {
    /// Canned 404 page, rendered when the route chain is exhausted.
    pub fn not_found(self) {
        self.page(404, "Not Found", "The requested resource does not exist.");
    }

    /// Canned 401 page (e.g., denied dotfile access).
    pub fn unauthorized(self) {
        self.page(401, "Unauthorized", "Access to this resource is denied.");
    }

    /// Generic 500 page carrying the dispatch error record.
    pub fn server_error(self, error: &HttpError) {
        let detail = error.message.clone();
        self.page(500, "Internal Server Error", &detail);
    }

    fn page(self, status: u16, title: &str, detail: &str) {
        if !self.response.sent {
            self.response
                .set_header("Content-Type", "text/html; charset=utf-8");
        }
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{status} {title}</title></head>\n\
             <body>\n<h1>{status} {title}</h1>\n<p>{detail}</p>\n</body>\n</html>\n"
        );
        self.response.commit(status, Body::Bytes(html.into_bytes()));
    }
}

/// Cookie recording surface returned by [`Response::cookies`].
pub struct Cookies<'a> {
    response: &'a mut Response,
}

impl Cookies<'_> {
    /// Record a cookie to be set on the client.
    ///
    /// Cookie changes are recorded even after the response body is sent;
    /// they ride along with whatever is flushed to the wire.
    pub fn create(self, name: &str, value: &str, priority: CookiePriority) {
        self.response.cookie_changes.push(CookieChange {
            name: name.to_string(),
            value: value.to_string(),
            priority,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
    }

    #[test]
    fn test_first_send_wins() {
        let mut res = Response::new();
        res.status(200).json(serde_json::json!({"ok": true}));
        res.status(500).end(b"late".to_vec());
        assert_eq!(res.status_code(), 200);
        assert!(matches!(res.body(), Body::Json(_)));
    }

    #[test]
    fn test_redirect_sets_location_and_sent() {
        let mut res = Response::new();
        res.redirect("/elsewhere");
        assert!(res.is_sent());
        assert_eq!(res.status_code(), 302);
        assert_eq!(res.get_header("location"), Some("/elsewhere"));
        res.redirect("/too-late");
        assert_eq!(res.redirect_target(), Some("/elsewhere"));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut res = Response::new();
        res.set_header("ETag", "\"a\"");
        res.set_header("etag", "\"b\"");
        assert_eq!(res.get_header("ETAG"), Some("\"b\""));
    }
}
