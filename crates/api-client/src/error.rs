//! Error types for the API client
//!
//! Failures fall into four families that callers must be able to tell apart:
//!
//! | Variant | Meaning | Retried |
//! |---------|---------|---------|
//! | [`ApiError::AuthRequired`] | protected call without a stored token | never, no I/O happens |
//! | [`ApiError::Network`] | transport never completed | yes, up to the attempt budget |
//! | [`ApiError::Http`] | non-2xx response | no |
//! | [`ApiError::Decode`] | body did not match the expected shape | no |
//! | [`ApiError::InvalidRequest`] | request could not be built, nothing sent | no |

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure raised by a [`Transport`](crate::transport::Transport) when the
/// HTTP exchange did not complete
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, reset, or name resolution failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// No response within the request timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Any other interruption of the exchange (e.g. body read aborted)
    #[error("{0}")]
    Other(String),

    /// The request could not be built, so nothing was sent
    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether sending again could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Request(_))
    }
}

/// API client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Protected call attempted with no stored token
    #[error("Authentication required")]
    AuthRequired,

    /// Backend could not be reached within the attempt budget
    #[error("Server unreachable after {attempts} attempt(s): {source}")]
    Network {
        /// Number of attempts made
        attempts: u32,
        /// Failure of the last attempt
        #[source]
        source: TransportError,
    },

    /// Backend answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Request body could not be serialized
    #[error("Invalid request body: {0}")]
    Encode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Endpoint produced an unusable URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request was rejected locally before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// HTTP status, if the backend answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could succeed without any change on our side
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether the backend is unreachable (expected while offline)
    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether the user has to sign in (again)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::Http { status: 401, .. })
    }

    /// Whether the backend rejected the submitted data
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Http { status: 400 | 422, .. })
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if *status >= 500)
    }
}

impl From<rehab_core::Error> for ApiError {
    fn from(err: rehab_core::Error) -> Self {
        if err.is_config() {
            Self::Config(err.to_string())
        } else {
            Self::Storage(err.to_string())
        }
    }
}

/// Serializable `{ ok, data | error }` envelope
///
/// Presentation code that wants the tagged-union wire shape converts an
/// [`ApiResult`] with `ApiResponse::from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded
    pub ok: bool,
    /// Payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error string on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<ApiResult<T>> for ApiResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                ok: false,
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}
