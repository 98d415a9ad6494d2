//! Error types for the shipping API client.
//!
//! # Design
//! Precondition failures (`AlreadyCreated`, `MissingId`, `EmptyQuery`,
//! `MissingTrackingNumber`) are raised locally before any request is built,
//! so callers can tell "I misused the API" apart from anything the server or
//! the transport reported. `EncodeError` covers record shapes the encoder
//! cannot flatten; those are bugs in a descriptor table, not runtime
//! conditions.

use thiserror::Error;

/// Failures while flattening a record into parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{record} has no field named `{field}`")]
    UnknownField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record}.{field} is declared as a {expected} but holds a {found}")]
    ShapeMismatch {
        record: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{record}.{field} cannot be flattened into a single parameter")]
    Unsupported {
        record: &'static str,
        field: &'static str,
    },

    #[error("parameter `{0}` emitted more than once")]
    DuplicateKey(String),
}

/// Errors returned by the client and the lifecycle operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `create` was called on a shipment that already has a server id.
    #[error("shipment {0} already exists and cannot be created again")]
    AlreadyCreated(i64),

    /// An id-bound operation was called on a record without an id.
    #[error("a shipment id is required")]
    MissingId,

    #[error("a search query is required")]
    EmptyQuery,

    #[error("a tracking number is required")]
    MissingTrackingNumber,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// Raised by the caller-supplied transport; passed through untouched.
    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ApiError {
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ApiError::Transport(err.into())
    }

    /// True for local validation failures that never reached the transport.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ApiError::AlreadyCreated(_)
                | ApiError::MissingId
                | ApiError::EmptyQuery
                | ApiError::MissingTrackingNumber
        )
    }
}
