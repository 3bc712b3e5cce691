use std::sync::Arc;

use crate::dispatcher::{HttpError, Next};
use crate::error::ConfigError;
use crate::route::Handler;
use crate::server::{Request, Response};

/// Callback invoked by the recovery route when a handler fails.
///
/// Receives the structured error record and the request/response pair. If
/// the callback itself fails (or is absent), the dispatcher falls back to
/// the generic 500 page.
pub type ErrorHandler =
    Arc<dyn Fn(&HttpError, &mut Request, &mut Response) -> anyhow::Result<()> + Send + Sync>;

/// Server-level configuration consumed by the dispatch core.
///
/// Holds the language negotiation settings and the optional framework hooks
/// (session, logger, error callback) that the dispatcher turns into
/// cross-cutting routes. Built once at startup and shared immutably across
/// requests behind `Arc`.
#[derive(Clone)]
pub struct ServerConfig {
    supported_languages: Vec<String>,
    default_language: String,
    user_sessions: Option<Handler>,
    logger: Option<Handler>,
    on_http_error: Option<ErrorHandler>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            supported_languages: vec!["en".to_string()],
            default_language: "en".to_string(),
            user_sessions: None,
            logger: None,
            on_http_error: None,
        }
    }
}

impl ServerConfig {
    /// Create a config with the given language settings.
    ///
    /// Fails fast when the default language is missing from the supported
    /// list; an inconsistent language setup should abort startup, not
    /// surface per-request.
    pub fn new(
        supported_languages: Vec<String>,
        default_language: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let default_language = default_language.into();
        if !supported_languages.contains(&default_language) {
            return Err(ConfigError::UnsupportedDefaultLanguage {
                language: default_language,
            });
        }
        Ok(Self {
            supported_languages,
            default_language,
            ..Self::default()
        })
    }

    /// Register the session middleware handler.
    #[must_use]
    pub fn with_user_sessions<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &mut Next) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.user_sessions = Some(Arc::new(handler));
        self
    }

    /// Register the logger middleware handler.
    #[must_use]
    pub fn with_logger<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &mut Next) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.logger = Some(Arc::new(handler));
        self
    }

    /// Register the error callback invoked by recovery routes.
    #[must_use]
    pub fn with_on_http_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HttpError, &mut Request, &mut Response) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.on_http_error = Some(Arc::new(handler));
        self
    }

    /// Languages the server can negotiate.
    #[must_use]
    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    /// The fallback language.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Whether a language tag is supported.
    #[must_use]
    pub fn supports(&self, language: &str) -> bool {
        self.supported_languages.iter().any(|l| l == language)
    }

    /// The session middleware handler, if configured.
    #[must_use]
    pub fn user_sessions(&self) -> Option<Handler> {
        self.user_sessions.clone()
    }

    /// The logger middleware handler, if configured.
    #[must_use]
    pub fn logger(&self) -> Option<Handler> {
        self.logger.clone()
    }

    /// The error callback, if configured.
    #[must_use]
    pub fn on_http_error(&self) -> Option<ErrorHandler> {
        self.on_http_error.clone()
    }
}
