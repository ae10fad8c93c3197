//! Unified error types for the Gap core.
//!
//! Inbound dispatch failures and outbound request failures are kept in
//! separate enums: a dispatch error only ever affects the single webhook
//! request that produced it, while outbound errors are returned to the
//! caller of the client method.

use thiserror::Error;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors that can occur while decoding or dispatching an inbound event.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The request body could not be decoded into an update.
    #[error("malformed update: {reason}")]
    MalformedUpdate {
        /// Reason for failure.
        reason: String,
    },

    /// The `data` field of a `paycallback` event is not a JSON object.
    #[error("malformed payment callback: {reason}")]
    MalformedPayment {
        /// Reason for failure.
        reason: String,
    },
}

impl DispatchError {
    /// Creates a malformed update error.
    pub fn malformed_update(reason: impl Into<String>) -> Self {
        Self::MalformedUpdate {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Outbound Errors
// =============================================================================

/// Errors returned by outbound API operations.
#[derive(Debug, Clone, Error)]
pub enum OutboundError {
    /// A media path does not point to an existing file.
    #[error("{kind} path is invalid: {path}")]
    InvalidPath {
        /// Media kind being sent (`image`, `video`, ...).
        kind: &'static str,
        /// The offending path.
        path: String,
    },

    /// A reply keyboard is not a list of rows.
    #[error("invalid keyboard: {0}")]
    InvalidKeyboard(String),

    /// The upload step of a media send failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The remote API rejected the token (HTTP 403).
    #[error("invalid token: {detail}")]
    InvalidToken {
        /// Response body, or a generic description when it was empty.
        detail: String,
    },

    /// The remote API call failed.
    ///
    /// `status` is `None` when the request never produced a response.
    #[error("request failed{}: {}", status_suffix(.status), .message)]
    Request {
        /// HTTP status code, if one was received.
        status: Option<u16>,
        /// Response body, or a transport error description.
        message: String,
    },

    /// Failed to serialize a request parameter.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl OutboundError {
    /// Creates a request error from a status and response body.
    ///
    /// An empty body falls back to a generic description.
    pub fn request(status: Option<u16>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Request {
            status,
            message: if body.is_empty() {
                "an error was encountered".to_string()
            } else {
                body
            },
        }
    }

    /// Classifies a non-success HTTP response.
    ///
    /// A 403 is always reported as [`OutboundError::InvalidToken`], with the
    /// body kept as its detail.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == 403 {
            Self::InvalidToken {
                detail: if body.is_empty() {
                    "forbidden".to_string()
                } else {
                    body
                },
            }
        } else {
            Self::request(Some(status), body)
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl From<serde_json::Error> for OutboundError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised by the transport layer outside of individual API calls.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The webhook listener could not bind its address.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// The address that failed to bind.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while registering handlers.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// A text route pattern failed to compile.
    #[error("invalid text route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for inbound dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for outbound operations.
pub type OutboundResult<T> = Result<T, OutboundError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for registration operations.
pub type CoreResult<T> = Result<T, CoreError>;
