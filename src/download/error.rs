//! Error types for the download module.
//!
//! Every failure carries the context needed to log it (URL, host or path),
//! and can be classified into a coarse [`ErrorKind`] for callers that only
//! care whether retrying makes sense.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`DownloadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL could not be turned into a reachable endpoint (DNS, connect).
    Resolution,
    /// The server answered with something other than an accepted 2xx response.
    Protocol,
    /// The connection broke mid-exchange, typically while streaming the body.
    Transport,
    /// The destination file could not be opened or written.
    LocalIo,
}

/// Errors that can occur while querying or transferring a remote file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL has no usable host.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The URL names a scheme other than plain `http://`.
    #[error("unsupported scheme '{scheme}' in {url}")]
    UnsupportedScheme {
        /// The URL as given.
        url: String,
        /// The scheme found before `://`.
        scheme: String,
    },

    /// Host name resolution failed or produced no endpoints.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        /// The host that could not be resolved.
        host: String,
        /// The underlying resolver error.
        #[source]
        source: std::io::Error,
    },

    /// Every resolved endpoint refused or timed out the connection.
    #[error("failed to connect to {host}: {source}")]
    Connect {
        /// The host being connected to.
        host: String,
        /// The error from the last endpoint tried.
        #[source]
        source: std::io::Error,
    },

    /// The response head could not be parsed.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The URL that was requested.
        url: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The connection failed while sending the request or streaming the body.
    #[error("transport error downloading {url}: {source}")]
    Transport {
        /// The URL being downloaded.
        url: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// File system error on the destination file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unsupported scheme error.
    pub fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates a name resolution error.
    pub fn resolve(host: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resolve {
            host: host.into(),
            source,
        }
    }

    /// Creates a connection error.
    pub fn connect(host: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            host: host.into(),
            source,
        }
    }

    /// Creates a malformed response error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. }
            | Self::UnsupportedScheme { .. }
            | Self::Resolve { .. }
            | Self::Connect { .. } => ErrorKind::Resolution,
            Self::MalformedResponse { .. } | Self::HttpStatus { .. } => ErrorKind::Protocol,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Io { .. } => ErrorKind::LocalIo,
        }
    }
}
