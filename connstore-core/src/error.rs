//! Error types for the connection store
//!
//! Each collaborator has its own error enum. `ConnStoreError` wraps them for the
//! `ConnectionStore` facade without translating the underlying cause.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the durable profile/group configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the configuration file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// A value failed validation
    #[error("Validation error for {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The referenced profile or group does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An equivalent profile or group already exists
    #[error("Already exists: {0}")]
    Duplicate(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by credential vault backends
#[derive(Debug, Error)]
pub enum SecretError {
    /// No usable backend
    #[error("Secret backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Writing a secret failed
    #[error("Failed to store secret: {0}")]
    StoreFailed(String),

    /// Reading a secret failed
    #[error("Failed to retrieve secret: {0}")]
    RetrieveFailed(String),

    /// Removing a secret failed
    #[error("Failed to delete secret: {0}")]
    DeleteFailed(String),

    /// libsecret / secret-tool failure
    #[error("libsecret error: {0}")]
    LibSecret(String),
}

/// Result type for secret operations
pub type SecretResult<T> = Result<T, SecretError>;

/// Errors raised by the application state store
#[derive(Debug, Error)]
pub enum StateError {
    /// Reading or writing the state file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A state value could not be (de)serialized
    #[error("State serialization error: {0}")]
    Serialize(String),
}

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;

/// Top-level error for `ConnectionStore` operations
#[derive(Debug, Error)]
pub enum ConnStoreError {
    /// Durable store rejected the operation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credential vault rejected the operation
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// State store rejected the operation
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result type for `ConnectionStore` operations
pub type ConnStoreResult<T> = Result<T, ConnStoreError>;
