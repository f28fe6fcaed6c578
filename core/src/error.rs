//! Error types for the gateway client.
//!
//! # Design
//! Every response with status >= 400 becomes an `HttpError` carrying the
//! status code and the parsed body, whatever the status. Transport failures
//! are boxed untouched in `ApiError::Transport` so the caller can downcast to
//! the executor's own error type (e.g. `reqwest::Error::is_connect`).

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// A gateway response with status >= 400.
///
/// The gateway's error payload is `{ "code": ..., "message": ... }`; the
/// display message is `body.message` when present.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    pub status_code: u16,
    pub body: Value,
}

impl HttpError {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// The `code` field of the error payload.
    pub fn code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    /// The `message` field of the error payload.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None => write!(f, "HTTP {}", self.status_code),
        }
    }
}

impl std::error::Error for HttpError {}

/// A `:name` placeholder could not be filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing value for uri parameter `{0}`")]
    MissingParam(String),

    #[error("uri parameter `{0}` must be a string, number or boolean")]
    InvalidParam(String),
}

/// Errors returned by `Okapi` verbs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The executor failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The gateway error, if the call reached the gateway and was rejected.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            ApiError::Http(err) => Some(err),
            _ => None,
        }
    }

    /// The executor's own error, if it has type `T`.
    pub fn transport<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            ApiError::Transport(err) => err.downcast_ref::<T>(),
            _ => None,
        }
    }
}
