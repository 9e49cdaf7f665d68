//! Error taxonomy of the network pipeline.
//!
//! [`NetworkError`] says why the raw I/O failed. [`DataTransferError`] says
//! what the data-transfer layer did with a transport or decode failure.

use std::{error::Error as StdError, sync::Arc};

use bytes::Bytes;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Transport-level failure classification.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("request failed with status code {status_code}")]
    HttpError {
        status_code: u16,
        data: Option<Bytes>,
    },

    #[error("no internet connection")]
    NotConnected,

    #[error("request was cancelled")]
    Cancelled,

    #[error("could not build a request url")]
    UrlGeneration,

    #[error("network request failed: {0}")]
    Generic(#[source] Arc<dyn StdError + Send + Sync + 'static>),
}

impl NetworkError {
    pub fn generic(error: impl Into<BoxError>) -> Self {
        NetworkError::Generic(Arc::from(error.into()))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::HttpError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn has_status_code(&self, code: u16) -> bool {
        self.status_code() == Some(code)
    }

    pub fn is_not_found(&self) -> bool {
        self.has_status_code(404)
    }
}

impl PartialEq for NetworkError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                NetworkError::HttpError {
                    status_code: a,
                    data: da,
                },
                NetworkError::HttpError {
                    status_code: b,
                    data: db,
                },
            ) => a == b && da == db,
            (NetworkError::NotConnected, NetworkError::NotConnected)
            | (NetworkError::Cancelled, NetworkError::Cancelled)
            | (NetworkError::UrlGeneration, NetworkError::UrlGeneration) => true,
            // underlying errors carry no equality of their own
            (NetworkError::Generic(a), NetworkError::Generic(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Failure surfaced by the data-transfer layer to its callers.
#[derive(Debug, Error)]
pub enum DataTransferError {
    #[error("server returned no data")]
    NoResponse,

    #[error("could not parse server response: {0}")]
    Parsing(#[source] BoxError),

    #[error(transparent)]
    NetworkFailure(#[from] NetworkError),

    #[error("{0}")]
    ResolvedNetworkFailure(#[source] BoxError),
}

impl DataTransferError {
    /// The transport error behind this failure, if the resolver left it untouched.
    pub fn network_error(&self) -> Option<&NetworkError> {
        match self {
            DataTransferError::NetworkFailure(err) => Some(err),
            _ => None,
        }
    }
}

/// Reasons an endpoint could not be turned into a request.
///
/// The executor collapses all of these into [`NetworkError::UrlGeneration`].
#[derive(Debug, Error)]
pub enum RequestGenerationError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to encode parameters: {0}")]
    ParameterEncoding(#[from] serde_json::Error),

    #[error("parameters must encode to a key/value object")]
    NotAnObject,

    #[error("body encoder could not encode parameters")]
    BodyEncoding,
}
