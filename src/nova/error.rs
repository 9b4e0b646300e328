//! Error types for the OpenStack Compute client.

use thiserror::Error;

use crate::compute::{LifecycleError, RequestError};
use crate::config::ConfigError;

/// Errors raised by the OpenStack Compute client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NovaClientError {
    /// Raised when the configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request is missing a required field.
    #[error("invalid server request: {0}")]
    Validation(String),
    /// Raised when the request never produced a response.
    #[error("request to {url} failed: {message}")]
    Http {
        /// Target URL.
        url: String,
        /// Transport error message.
        message: String,
    },
    /// Raised when the service answers with a non-success status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        /// Operation being performed (for example `resize`).
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body returned by the service.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("could not decode {operation} response: {message}")]
    Decode {
        /// Operation being performed.
        operation: String,
        /// Decoder error message.
        message: String,
    },
    /// Raised by the polling helpers.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<RequestError> for NovaClientError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Validation(field) => Self::Validation(field),
        }
    }
}

impl From<ConfigError> for NovaClientError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
