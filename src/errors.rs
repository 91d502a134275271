//! Error hierarchy for the etcd v2 client.
//!
//! Two layers, mirroring how callers experience failures:
//! - [`ClientApiError`]: the semantic status of a single key/value operation
//!   (what the store or the transport told us), carried by every operation
//!   result.
//! - [`Error`]: construction-time failures (bad configuration, unusable
//!   endpoint, transport setup) surfaced by the builder and config loader.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by every key/value operation.
pub type ClientApiResult<T> = std::result::Result<T, ClientApiError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport could not be set up for an endpoint
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures reported by the HTTP transport collaborator.
///
/// Any of these means "no response was received" from the pipeline's point of
/// view.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection to {endpoint} failed: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Transport failure: {0}")]
    Io(String),
}

/// Semantic status codes of a key/value operation.
///
/// Success is expressed as `Ok(..)`, so there is no `Ok` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// HTTP 403
    PermissionDenied,
    /// HTTP 404
    NotFound,
    /// HTTP 412, and every malformed response shape
    FailedPrecondition,
    /// Directory operation on a non-directory
    InvalidArgument,
    /// HTTP 500, or leader redirects exhausted
    Unavailable,
    /// Anything else, including transport failures
    Unknown,
    /// Operation or watch terminated cooperatively
    Cancelled,
}

impl ErrorCode {
    /// Maps an HTTP status code to a semantic code.
    ///
    /// Returns `None` for the success codes (200, 201).
    pub fn from_http_status(status: u16) -> Option<Self> {
        match status {
            200 | 201 => None,
            403 => Some(ErrorCode::PermissionDenied),
            404 => Some(ErrorCode::NotFound),
            412 => Some(ErrorCode::FailedPrecondition),
            500 => Some(ErrorCode::Unavailable),
            _ => Some(ErrorCode::Unknown),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Failure status of a key/value operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ClientApiError {
    code: ErrorCode,
    message: String,
}

impl ClientApiError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Malformed or unexpected response shape
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FailedPrecondition, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "cancelled")
    }

    /// Returns the error code associated with this error
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }

    /// Whether repeating the same operation later may succeed.
    ///
    /// Store-side unavailability and transport failures are transient; shape
    /// and precondition failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::Unavailable | ErrorCode::Unknown)
    }
}

impl From<TransportError> for ClientApiError {
    fn from(err: TransportError) -> Self {
        ClientApiError::unknown(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ClientApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            ClientApiError::cancelled()
        } else {
            ClientApiError::unknown(format!("watch task failed: {err}"))
        }
    }
}
