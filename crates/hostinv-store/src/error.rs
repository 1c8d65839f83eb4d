//! Error types for hostinv-store

use std::time::Duration;

use hostinv_core::{DataError, FilterError};
use thiserror::Error;

/// Errors that can occur while reading or writing the inventory
#[derive(Error, Debug)]
pub enum StoreError {
    /// No entry for the host
    #[error("host not found: {0}")]
    NotFound(String),

    /// The host exists but has no such attribute
    #[error("host `{host}` has no attribute `{field}`")]
    FieldNotFound {
        /// Host name
        host: String,
        /// Missing attribute
        field: String,
    },

    /// An entry for the host already exists
    #[error("host already exists: {0}")]
    AlreadyExists(String),

    /// Concurrent writers kept changing the host during a read-modify-write
    #[error("host `{host}` changed concurrently, gave up after {attempts} attempts")]
    Conflict {
        /// Host name
        host: String,
        /// Attempts made
        attempts: u32,
    },

    /// Store could not be reached
    #[error("store unavailable at {endpoint}: {message}")]
    Unavailable {
        /// Endpoint that was contacted
        endpoint: String,
        /// Underlying failure
        message: String,
    },

    /// Request exceeded the configured timeout
    #[error("store request timed out after {timeout:?}")]
    Timeout {
        /// Timeout that was exceeded
        timeout: Duration,
    },

    /// Stored entry or gateway response could not be decoded
    #[error("cannot decode `{key}`: {message}")]
    Decode {
        /// Key or endpoint path being decoded
        key: String,
        /// What went wrong
        message: String,
    },

    /// Gateway answered with a non-success status
    #[error("store gateway error ({status}): {message}")]
    Gateway {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Invalid endpoint URL
    #[error("invalid store endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Invalid host name, field name or host data
    #[error(transparent)]
    Data(#[from] DataError),

    /// Filter failed while listing
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl StoreError {
    /// Check if the operation may succeed when retried
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. }
                | StoreError::Timeout { .. }
                | StoreError::Conflict { .. }
        )
    }

    /// Check if the host or attribute does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::FieldNotFound { .. }
        )
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
