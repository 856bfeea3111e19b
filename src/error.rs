//! Error types returned by the client.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Every failure the client can surface to a caller.
///
/// Nothing in the crate retries on its own; [`ApiError::is_retryable`] tells
/// callers which failures are worth a backoff-and-retry of their own.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad constructor arguments, unknown API version or unknown API name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The client-credentials grant was rejected or returned no token.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The configured auth method is not supported.
    #[error("{0} not yet implemented")]
    NotImplemented(String),

    /// `X-RateLimit-Remaining` dropped below one.
    #[error("You have reached the API limit of {limit} requests, please wait before retrying.")]
    RateLimitExceeded { limit: u32 },

    /// HTTP 400 with a `message` payload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 500 with a `message` payload.
    #[error("Server error: {0}")]
    ServerError(String),

    /// HTTP 401 with a `message` payload.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 422 carrying field errors.
    #[error("{0}")]
    ValidationFailed(String),

    /// Any other error status with a parseable body.
    #[error("{message} (HTTP {status})")]
    GenericApiError {
        message: String,
        status: u16,
        /// Code nested in an OAuth-style `error` object, when present.
        code: Option<String>,
    },

    /// Error body that is not JSON, or a transport-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API could not be reached (connection refused, timeout).
    #[error("API not responding: {0}")]
    NotResponding(String),

    /// Cache miss on `get`.
    #[error("No cached response for key \"{0}\"")]
    NotFound(String),

    /// A fetched page has no `_embedded.items` sequence.
    #[error("Page is missing the _embedded.items collection")]
    MissingEmbeddedItems,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::ValidationFailed(_) => Some(422),
            ApiError::ServerError(_) => Some(500),
            ApiError::GenericApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the same request may succeed later without any change.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimitExceeded { .. }
            | ApiError::ServerError(_)
            | ApiError::NotResponding(_) => true,
            ApiError::GenericApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            ApiError::NotResponding(error.to_string())
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ApiError {
    fn from(error: reqwest::header::InvalidHeaderValue) -> Self {
        ApiError::Transport(format!("Invalid header value: {}", error))
    }
}

impl From<reqwest::header::InvalidHeaderName> for ApiError {
    fn from(error: reqwest::header::InvalidHeaderName) -> Self {
        ApiError::Transport(format!("Invalid header name: {}", error))
    }
}
