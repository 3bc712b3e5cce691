use std::collections::HashMap;
use std::str::FromStr;

use http::Method;
use serde_json::Value;

/// Color scheme negotiated for a request via the `color-scheme` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Default,
    Light,
    Dark,
}

impl FromStr for ColorScheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Default" => Ok(ColorScheme::Default),
            "Light" => Ok(ColorScheme::Light),
            "Dark" => Ok(ColorScheme::Dark),
            _ => Err(()),
        }
    }
}

impl ColorScheme {
    /// Cookie value for this scheme.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Default => "Default",
            ColorScheme::Light => "Light",
            ColorScheme::Dark => "Dark",
        }
    }
}

/// Stored preferences of the authenticated user.
#[derive(Debug, Clone, Default)]
pub struct UserPreferences {
    /// Preferred UI language, if the user has stored one
    pub language: Option<String>,
}

/// Authentication context attached to a request by the session layer.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub logged_in: bool,
    pub preferences: UserPreferences,
}

/// Parse cookies out of a header map (expects lowercase header keys).
#[must_use]
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a request target.
///
/// Extracts everything after the `?` character and URL-decodes parameter
/// names and values.
#[must_use]
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    if let Some(pos) = target.find('?') {
        let query_str = &target[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Split a request target into non-empty path segments.
///
/// The query string is dropped and empty segments are discarded, so `/`,
/// `//`, and trailing slashes all normalize consistently (`/` is the empty
/// segment sequence).
#[must_use]
pub fn parse_path_segments(target: &str) -> Vec<String> {
    let path = target.split('?').next().unwrap_or("/");
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Normalized request object consumed by the dispatch core.
///
/// Produced by the transport layer (out of scope here) from the raw HTTP
/// request. `params` is match-scoped output the dispatcher overwrites for
/// every route it runs; the language/locale/color-scheme fields are written
/// only by the framework's cross-cutting routes.
#[derive(Debug)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Ordered non-empty path segments (root `/` is the empty sequence)
    pub path: Vec<String>,
    /// Subdomain the request was addressed to, if any
    pub subdomain: Option<String>,
    /// URL-decoded query parameters
    pub query: HashMap<String, String>,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HashMap<String, String>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed JSON body, if present
    pub body: Option<Value>,
    /// Session/user context
    pub user: UserContext,
    /// Path parameters bound by the most recent route match
    pub params: HashMap<String, String>,
    language: Option<String>,
    locale: Option<String>,
    color_scheme: ColorScheme,
}

impl Request {
    /// Build a request from a method and target (path plus optional query).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            path: parse_path_segments(target),
            subdomain: None,
            query: parse_query_params(target),
            cookies: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            user: UserContext::default(),
            params: HashMap::new(),
            language: None,
            locale: None,
            color_scheme: ColorScheme::Default,
        }
    }

    /// Negotiated language, once the locale route has run.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Negotiated locale, once the locale route has run.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Negotiated color scheme, once the color-scheme route has run.
    #[must_use]
    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme
    }

    pub(crate) fn set_language(&mut self, language: String) {
        self.language = Some(language);
    }

    pub(crate) fn set_locale(&mut self, locale: String) {
        self.locale = Some(locale);
    }

    pub(crate) fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.color_scheme = scheme;
    }

    /// Reconstruct the request target (path plus query).
    ///
    /// Query pairs are emitted in sorted key order so the output is stable.
    #[must_use]
    pub fn href(&self) -> String {
        self.href_excluding(None)
    }

    /// `href()` with one query parameter removed. Used to rebuild the
    /// redirect target when the locale route strips `lang`.
    pub(crate) fn href_excluding(&self, drop: Option<&str>) -> String {
        let mut href = String::from("/");
        href.push_str(&self.path.join("/"));

        let mut pairs: Vec<(&String, &String)> = self
            .query
            .iter()
            .filter(|(k, _)| Some(k.as_str()) != drop)
            .collect();
        pairs.sort();

        if !pairs.is_empty() {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in pairs {
                serializer.append_pair(k, v);
            }
            href.push('?');
            href.push_str(&serializer.finish());
        }
        href
    }

    /// JSON summary of the request, embedded in dispatch error records.
    #[must_use]
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "method": self.method.as_str(),
            "href": self.href(),
            "subdomain": self.subdomain,
            "params": self.params,
        })
    }
}
