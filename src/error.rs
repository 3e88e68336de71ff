//! Error types for settings persistence, runner selection, and collaborator access.

use thiserror::Error;

/// Storage-level failures raised by durable settings backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the coordination layer and its primitives.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A settings write could not be made durable. Nothing was changed.
    #[error("Failed to persist setting '{key}': {source}")]
    PersistenceError {
        key: String,
        #[source]
        source: StorageError,
    },

    /// A runner name that is not registered with the multiplexer.
    #[error("Unknown implementation: {0}")]
    UnknownImplementation(String),

    /// A collaborator (solution, host, cleaner) is not available right now.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Output query failed for a single project.
    #[error("Output query failed for project '{project}': {message}")]
    ProjectQueryFailed { project: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Runner error: {0}")]
    RunnerError(String),

    /// A command was invoked while its enablement predicate is false.
    #[error("Command '{0}' cannot execute in the current state")]
    CommandDisabled(String),

    /// A background refresh task panicked or was aborted.
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl ApiError {
    pub fn persistence(key: impl Into<String>, source: StorageError) -> Self {
        ApiError::PersistenceError {
            key: key.into(),
            source,
        }
    }

    pub fn project_query(project: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ProjectQueryFailed {
            project: project.into(),
            message: message.into(),
        }
    }
}
