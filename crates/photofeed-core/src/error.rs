//! Error types for the photo feed
//!
//! Every failure surfaces as one distinguishable [`ErrorKind`] so that the
//! UI layer can pick between retry and terminal messaging.

use thiserror::Error;

/// Result type alias for photo feed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the photo feed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network or connection failure reported by the requester (timeouts included)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("Unexpected response status: {status}")]
    Response {
        /// HTTP status code
        status: u16,
    },

    /// The payload did not match the expected shape
    #[error("Malformed payload: {0}")]
    Data(String),

    /// A photo id that is not part of the local collection
    #[error("Photo not found: {0}")]
    NotFound(String),

    /// A request URL could not be constructed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The token provider could not supply a bearer token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was superseded before it completed
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Copyable discriminant of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Response,
    Data,
    NotFound,
    InvalidRequest,
    Authentication,
    Config,
    Cancelled,
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a response error for a non-2xx status
    pub fn response(status: u16) -> Self {
        Self::Response { status }
    }

    /// Create a data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Response { .. } => ErrorKind::Response,
            Self::Data(_) => ErrorKind::Data,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Config(_) => ErrorKind::Config,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Whether repeating the same call may succeed
    ///
    /// Transport failures, rate limiting and server-side errors are worth a retry;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Response { status } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Data(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
