//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Memo Error Enum ==
/// Unified error type for the memoizer and the request helper.
#[derive(Error, Debug)]
pub enum MemoError {
    /// The memoize config is incomplete or inconsistent
    #[error("Invalid memoize config: {0}")]
    Configuration(String),

    /// The producer returned something that cannot be stored as text
    #[error("Memoized function must return a string or an object, got {0}")]
    UnsupportedResultType(&'static str),

    /// A storage read, write or stat failed
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The wrapped function itself failed
    #[error(transparent)]
    Producer(anyhow::Error),

    /// Arguments or results could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A cache entry is not valid JSON although the config asks for JSON
    #[error("Cached entry at {} is not valid JSON: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Transport level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP request to \"{url}\" failed with status code: \"{status}\"")]
    HttpStatus { url: String, status: u16 },

    /// A configured request header is not a valid HTTP header
    #[error("Invalid header {0}")]
    InvalidHeader(String),

    /// Proxying is enabled but neither a proxy file nor a custom proxy is set
    #[error("\"proxyFile\" or \"proxyCustom\" must be specified")]
    MissingProxy,

    /// The proxy file holds no usable line
    #[error("Proxy file {} is empty", .0.display())]
    EmptyProxyList(PathBuf),
}

impl MemoError {
    /// Wraps an I/O failure with the path it happened on.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MemoError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Unwraps a producer failure that is itself a `MemoError`.
    ///
    /// Producers built on this crate report their own errors through
    /// `anyhow`; this hands the original variant back to the caller.
    pub fn into_original(self) -> Self {
        match self {
            MemoError::Producer(inner) => match inner.downcast::<MemoError>() {
                Ok(original) => original,
                Err(other) => MemoError::Producer(other),
            },
            other => other,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, MemoError>;
