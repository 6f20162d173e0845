use std::fmt;

use reqwest::StatusCode;

/// Failure of a single request against the task API.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: StatusCode, body: String },
    /// The response body did not match the expected shape.
    Decode(reqwest::Error),
    /// The request could not be built from the given input.
    InvalidInput(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) | ApiError::Decode(err) => err.status(),
            ApiError::InvalidInput(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(err) => write!(f, "request failed: {err}"),
            ApiError::Status { status, body } if body.trim().is_empty() => {
                write!(f, "server returned {status}")
            }
            ApiError::Status { status, body } => {
                write!(f, "server returned {status}: {}", body.trim())
            }
            ApiError::Decode(err) => write!(f, "failed to decode response: {err}"),
            ApiError::InvalidInput(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(err) | ApiError::Decode(err) => Some(err),
            ApiError::Status { .. } | ApiError::InvalidInput(_) => None,
        }
    }
}
