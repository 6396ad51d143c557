//! Error types for Bookstock
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by domain (configuration, persistence, query) for
//! better error handling and reporting.

use thiserror::Error;

/// Result type alias using our StoreError type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for Bookstock
///
/// Errors are contained at the operation boundary: gateway and query methods
/// return them to the caller, which decides whether to continue. Only a
/// configuration error at startup is fatal to the process.
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== Configuration Errors =====

    /// Connection string missing or unusable. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ===== Persistence Errors =====

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A tagged seed record whose kind is not one of the five entities.
    /// Skipped with a diagnostic; never aborts a batch.
    #[error("Unknown record kind: {0}")]
    UnknownRecordKind(String),

    /// A tagged seed record whose field mapping does not match its entity
    /// shape. Aborts (and rolls back) the whole load.
    #[error("Invalid fields for record kind '{kind}': {message}")]
    InvalidRecordFields { kind: String, message: String },

    // ===== Query Errors =====

    /// A join chain referenced an entity with no foreign-key edge to any
    /// entity already joined.
    #[error("No join path to {0}")]
    InvalidJoinPath(&'static str),

    // ===== External Library Errors =====
    // Automatic conversions from external error types

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// Create a Configuration error with a message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        StoreError::Configuration(message.into())
    }

    /// Create an InvalidRecordFields error for a record kind
    pub fn invalid_fields<S: Into<String>, M: Into<String>>(kind: S, message: M) -> Self {
        StoreError::InvalidRecordFields {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
