//! Backend error types.

use std::time::Duration;

use thiserror::Error;

use crate::types::IndexStatus;

/// Errors that can occur during backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Opening a graph instance against its storage engine failed
    #[error("failed to open backend: {message}")]
    OpenFailure { message: String },

    /// The `storage.backend` shorthand is not recognized
    #[error("unknown storage backend '{value}'")]
    UnknownBackend { value: String },

    /// An index did not reach the awaited status within the poll timeout
    #[error("index '{index}' did not reach status {target} within {waited:?}")]
    IndexBuildTimeout {
        index: String,
        target: String,
        waited: Duration,
    },

    /// No index with the given name exists
    #[error("index '{name}' not found")]
    IndexNotFound { name: String },

    /// A property key was referenced before being defined
    #[error("property key '{name}' not defined")]
    UnknownPropertyKey { name: String },

    /// An index status transition out of order
    #[error("index '{name}' cannot transition from {from} to {to}")]
    IllegalIndexTransition {
        name: String,
        from: IndexStatus,
        to: IndexStatus,
    },

    /// A committed write violated a unique index
    #[error("unique index '{index}' already contains a vertex with this '{key}' value")]
    UniqueConstraint { index: String, key: String },

    /// The graph instance has already been closed
    #[error("graph instance has been closed")]
    InstanceClosed,

    /// Internal backend failure
    #[error("{0}")]
    Internal(String),
}

impl BackendError {
    /// Create an OpenFailure error.
    pub fn open_failure(message: impl Into<String>) -> Self {
        Self::OpenFailure {
            message: message.into(),
        }
    }

    /// Create an UnknownBackend error.
    pub fn unknown_backend(value: impl Into<String>) -> Self {
        Self::UnknownBackend {
            value: value.into(),
        }
    }

    /// Create an IndexBuildTimeout error.
    pub fn index_build_timeout(
        index: impl Into<String>,
        target: impl Into<String>,
        waited: Duration,
    ) -> Self {
        Self::IndexBuildTimeout {
            index: index.into(),
            target: target.into(),
            waited,
        }
    }

    /// Create an IndexNotFound error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    /// Create an UnknownPropertyKey error.
    pub fn unknown_property_key(name: impl Into<String>) -> Self {
        Self::UnknownPropertyKey { name: name.into() }
    }

    /// Create a UniqueConstraint error.
    pub fn unique_constraint(index: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UniqueConstraint {
            index: index.into(),
            key: key.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::unknown_backend("bogus");
        assert!(err.to_string().contains("bogus"));

        let err = BackendError::index_build_timeout(
            "graph-name-index",
            "registered",
            Duration::from_secs(3),
        );
        assert!(err.to_string().contains("graph-name-index"));
        assert!(err.to_string().contains("registered"));
    }

    #[test]
    fn test_unique_constraint_display() {
        let err = BackendError::unique_constraint("graph-name-index", "graph.name");
        assert!(err.to_string().contains("graph-name-index"));
        assert!(err.to_string().contains("graph.name"));
    }
}
