//! Error types for lookups and startup configuration.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::request::LookupRequest;

/// Why a single lookup did not produce a [`StationRecord`](crate::record::StationRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// The remote service could not be reached, or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The response arrived but is missing required structure.
    #[error("Unexpected response format: {0}")]
    MalformedEnvelope(String),

    /// The service answered with a non-`ok` status; carries its `data` text.
    #[error("{0}")]
    RemoteError(String),
}

/// A failed lookup together with the request that produced it.
///
/// Failures are reported once and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub request: LookupRequest,
    pub kind: FailureKind,
}

impl LookupFailure {
    pub fn new(request: LookupRequest, kind: FailureKind) -> Self {
        Self { request, kind }
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.request, self.kind)
    }
}

impl std::error::Error for LookupFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Fatal startup problems. Raised before any lookup is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Must pass token")]
    MissingToken,

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid endpoint url {url}: {reason}")]
    Endpoint { url: String, reason: String },
}
