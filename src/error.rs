//! Error types surfaced by the client.
//!
//! Every failed request ends in exactly one [`MpesaApiError`], which carries
//! one [`MpesaError`]. Transport-native errors never reach the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code for a request that failed before any usable response and is
/// not worth retrying.
pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

/// Error code for connect failures that persisted through every attempt.
pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";

/// Error code for timeouts that persisted through every attempt.
pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";

/// Message used when an error body decodes but has no `errorMessage`.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Structured error attached to every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpesaError {
    /// One of `HTTP_<status>`, [`REQUEST_FAILED`], [`CONNECTION_ERROR`] or
    /// [`REQUEST_TIMEOUT`].
    pub error_code: String,
    pub error_message: String,
    /// HTTP status, only for errors built from a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Decoded JSON error body, if the response had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
    /// Provider request id (`requestId`), if the error body carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl MpesaError {
    /// Creates an error with no status, body or request id.
    pub fn new(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
            status_code: None,
            raw_response: None,
            request_id: None,
        }
    }

    /// Error for a received response with the given status.
    pub fn http(status: u16, error_message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status),
            ..Self::new(format!("HTTP_{}", status), error_message)
        }
    }

    /// Error for a request that failed without a usable response.
    pub fn request_failed(error_message: impl Into<String>) -> Self {
        Self::new(REQUEST_FAILED, error_message)
    }

    /// Error for a connect failure that outlasted every attempt.
    pub fn connection_error(error_message: impl Into<String>) -> Self {
        Self::new(CONNECTION_ERROR, error_message)
    }

    /// Error for a timeout that outlasted every attempt.
    pub fn request_timeout(error_message: impl Into<String>) -> Self {
        Self::new(REQUEST_TIMEOUT, error_message)
    }

    /// Attaches the decoded error body.
    pub fn with_raw_response(mut self, raw_response: Value) -> Self {
        self.raw_response = Some(raw_response);
        self
    }

    /// Attaches the provider request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// The single error type returned by [`crate::HttpClient`] requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}: {}", .error.error_code, .error.error_message)]
pub struct MpesaApiError {
    pub error: MpesaError,
}

impl MpesaApiError {
    /// Returns the error code of the wrapped error.
    pub fn error_code(&self) -> &str {
        &self.error.error_code
    }

    /// Returns the message of the wrapped error.
    pub fn error_message(&self) -> &str {
        &self.error.error_message
    }
}

impl From<MpesaError> for MpesaApiError {
    fn from(error: MpesaError) -> Self {
        Self { error }
    }
}

/// Errors raised while constructing a client.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Unknown environment '{0}'. Expected 'sandbox' or 'production'.")]
    UnknownEnvironment(String),
    #[error("Failed to initialise HTTP session: {0}")]
    Transport(String),
}
