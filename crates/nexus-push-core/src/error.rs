//! # Error Hierarchy
//!
//! Each subsystem owns a `thiserror` enum carrying the context an operator
//! needs: the endpoint, status and body for remote failures, the path for
//! local ones. [`NexusPushError`] aggregates them for callers that drive
//! several subsystems at once.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::metadata::MetadataError;
use crate::registry::RegistryError;
use crate::upload_spec::SpecParseError;

/// Errors from calls to the Nexus REST API.
#[derive(Debug, Error)]
pub enum NexusApiError {
    /// HTTP transport error (connection refused, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Nexus returned a non-2xx status.
    #[error("Nexus {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response body could not be decoded.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The server base URL cannot carry the REST path.
    #[error("invalid Nexus URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A file part could not be opened for streaming.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl NexusApiError {
    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Http { source, .. } | Self::Deserialization { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            Self::InvalidUrl { .. } | Self::Io { .. } => None,
        }
    }
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum NexusPushError {
    /// Remote API failure.
    #[error("Nexus API error: {0}")]
    Api(#[from] NexusApiError),

    /// Upload specification could not be parsed.
    #[error("upload settings error: {0}")]
    Spec(#[from] SpecParseError),

    /// Metadata document could not be read or written.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Server registry failure.
    #[error("server registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Client configuration failure.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
