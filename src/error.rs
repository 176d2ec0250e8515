//! Error taxonomy shared across the crate.

use thiserror::Error;

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for credential handling and YouTube API access.
#[derive(Debug, Error)]
pub enum Error {
    /// A credential, configuration, or output file could not be read or written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A persisted token record or client-secrets file failed to decode.
    #[error("{context}: {source}")]
    Format {
        context: String,
        #[source]
        source: Source,
    },

    /// No authorization code was received, or a token exchange/refresh failed
    /// with no successful fallback.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A channel, video, or caption track does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A listing or detail call against the remote API failed; carries the
    /// original cause.
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: Source,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn format(context: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Format {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn remote(context: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Remote {
            context: context.into(),
            source: source.into(),
        }
    }
}
