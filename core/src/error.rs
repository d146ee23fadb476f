//! Error types for the escalation and alert-routing engine.
//!
//! Entry points distinguish failures that abort a message (malformed input,
//! unknown node) from downstream failures that are reported and swallowed so
//! the remaining steps of the same lifecycle event still run.

use thiserror::Error;

/// Result type alias for engine operations
pub type WardenResult<T> = Result<T, WardenError>;

/// Errors that can occur while processing lifecycle events
#[derive(Error, Debug)]
pub enum WardenError {
    /// An inbound lifecycle event failed to parse or is missing required fields.
    /// Fatal for that message; the message is dropped with a loud log.
    #[error("malformed lifecycle event: {message}")]
    MalformedEvent { message: String },

    /// Node lookup failed. Fatal for that message; without node context no
    /// alert can be routed.
    #[error("unknown node: {id}")]
    NodeNotFound { id: String },

    /// An alert channel send failed
    #[error("alert channel error: {message}")]
    AlertChannel { message: String },

    /// A rotation control-plane call failed
    #[error("rotation control error: {message}")]
    RotationControl { message: String },

    /// A paging-system call failed
    #[error("paging error: {message}")]
    Paging { message: String },

    /// A node status write failed
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// A lifecycle bus publish or dispatch failed
    #[error("lifecycle bus error: {message}")]
    Bus { message: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Config { message: String },

    /// HTTP transport error from a collaborator call
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WardenError {
    /// Create a malformed-event error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }

    /// Create a node-not-found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create an alert channel error
    pub fn channel(message: impl Into<String>) -> Self {
        Self::AlertChannel {
            message: message.into(),
        }
    }

    /// Create a rotation control error
    pub fn rotation(message: impl Into<String>) -> Self {
        Self::RotationControl {
            message: message.into(),
        }
    }

    /// Create a paging error
    pub fn paging(message: impl Into<String>) -> Self {
        Self::Paging {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a bus error
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error aborts processing of the current message.
    ///
    /// Malformed input and failed node resolution make the message
    /// unprocessable; every other failure is reported and the remaining
    /// steps of the lifecycle event still run.
    pub fn is_fatal_for_message(&self) -> bool {
        matches!(
            self,
            Self::MalformedEvent { .. } | Self::NodeNotFound { .. }
        )
    }
}
