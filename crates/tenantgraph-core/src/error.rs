//! Lifecycle-layer error types.

use tenantgraph_backend::BackendError;
use tenantgraph_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the configuration store, registry, and factory.
#[derive(Error, Debug)]
pub enum ManagementError {
    /// No configuration exists for the graph name
    #[error("no configuration exists for graph '{name}'; create one first")]
    ConfigNotFound { name: String },

    /// No template configuration exists
    #[error("no template configuration exists; create one before calling create()")]
    TemplateNotFound,

    /// A configuration already exists for the graph name
    #[error("a configuration for graph '{name}' already exists")]
    DuplicateConfig { name: String },

    /// A template configuration already exists
    #[error("a template configuration already exists; only one is allowed")]
    DuplicateTemplate,

    /// The configuration store's backing graph violates its own invariants
    #[error("configuration store is corrupt: {message}")]
    StoreCorruption { message: String },

    /// Configuration validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend error
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ManagementError {
    /// Create a ConfigNotFound error.
    pub fn config_not_found(name: impl Into<String>) -> Self {
        Self::ConfigNotFound { name: name.into() }
    }

    /// Create a DuplicateConfig error.
    pub fn duplicate_config(name: impl Into<String>) -> Self {
        Self::DuplicateConfig { name: name.into() }
    }

    /// Create a StoreCorruption error.
    pub fn store_corruption(message: impl Into<String>) -> Self {
        Self::StoreCorruption {
            message: message.into(),
        }
    }
}
