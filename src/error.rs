use std::path::PathBuf;

use thiserror::Error;

/// Construction-time configuration failures.
///
/// Raised while the route table is being built (invalid patterns, unreadable
/// static roots, missing favicon files, inconsistent language configuration).
/// Nothing in this crate recovers from these at request time; they are meant
/// to abort server startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A path pattern could not be parsed.
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPathPattern {
        /// The offending pattern as registered
        pattern: String,
        /// Why parsing rejected it
        reason: String,
    },

    /// A static root does not exist or cannot be read.
    #[error("static root {root:?} is not readable: {source}")]
    StaticRootUnreadable {
        /// The configured root path
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A static root exists but is not a directory.
    #[error("static root {root:?} is not a directory")]
    StaticRootNotADirectory {
        /// The configured root path
        root: PathBuf,
    },

    /// `favicon()` was pointed at a directory with no `favicon*` file.
    #[error("directory {dir:?} does not contain a file named with the `favicon` prefix")]
    FaviconMissing {
        /// The directory that was searched
        dir: PathBuf,
    },

    /// `favicon()` was pointed at something that is not a readable directory.
    #[error("favicon path {dir:?} is not a readable directory: {source}")]
    FaviconDirUnreadable {
        /// The configured path
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured default language is missing from the supported list.
    #[error("default language `{language}` is not in the supported language list")]
    UnsupportedDefaultLanguage {
        /// The rejected default language
        language: String,
    },
}
