//! Error types for the Eventbook API client

use thiserror::Error;

/// Errors that can occur when calling the Eventbook API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Missing or rejected session token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The API answered with a non-success status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// `error` field of the response body
        message: String,
    },

    /// Login succeeded but no session cookie came back
    #[error("No session token in response")]
    MissingToken,
}

impl ApiError {
    /// HTTP status of the failure, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
