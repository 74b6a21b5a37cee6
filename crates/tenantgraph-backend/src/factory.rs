//! Backend factory trait and the in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tenantgraph_config::{BackendFamily, GraphConfig, PROPERTY_STORAGE_BACKEND};
use tracing::debug;

use crate::error::BackendError;
use crate::memory::{MemoryGraph, MemoryGraphOptions};
use crate::traits::GraphInstance;

/// Opens graph instances from fully resolved configurations.
///
/// The lifecycle layer never constructs instances directly; it hands a
/// resolved configuration to a factory and receives an opened handle. A
/// production deployment registers one factory covering its available
/// storage adapters.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Open a graph instance for `config`.
    ///
    /// The configuration must already carry its backend scoping defaults;
    /// factories do not derive them.
    async fn instantiate(
        &self,
        config: &GraphConfig,
    ) -> Result<Arc<dyn GraphInstance>, BackendError>;
}

/// Factory for the `inmemory` backend family.
///
/// Every instantiation opens a fresh, empty graph; in-memory graphs have no
/// durable state to reattach to.
pub struct MemoryBackendFactory {
    options: MemoryGraphOptions,
}

impl MemoryBackendFactory {
    /// Create a factory producing graphs with default options.
    pub fn new() -> Self {
        Self {
            options: MemoryGraphOptions::default(),
        }
    }

    /// Create a factory producing graphs with the given options.
    pub fn with_options(options: MemoryGraphOptions) -> Self {
        Self { options }
    }
}

impl Default for MemoryBackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendFactory for MemoryBackendFactory {
    async fn instantiate(
        &self,
        config: &GraphConfig,
    ) -> Result<Arc<dyn GraphInstance>, BackendError> {
        let shorthand = config.get_str(PROPERTY_STORAGE_BACKEND).ok_or_else(|| {
            BackendError::open_failure(format!(
                "configuration is missing the \"{PROPERTY_STORAGE_BACKEND}\" property"
            ))
        })?;

        match BackendFamily::from_shorthand(shorthand) {
            Some(BackendFamily::Memory) => {
                debug!(
                    "instantiating in-memory graph for '{}'",
                    config.graph_name().unwrap_or("<unnamed>")
                );
                Ok(Arc::new(MemoryGraph::open(
                    config.clone(),
                    self.options.clone(),
                )))
            }
            Some(family) => Err(BackendError::open_failure(format!(
                "backend family '{family}' has no adapter registered in this process"
            ))),
            None => Err(BackendError::unknown_backend(shorthand)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantgraph_config::PROPERTY_GRAPH_NAME;

    #[tokio::test]
    async fn test_instantiates_memory_graph() {
        let factory = MemoryBackendFactory::new();
        let config: GraphConfig = [
            (PROPERTY_STORAGE_BACKEND, "inmemory"),
            (PROPERTY_GRAPH_NAME, "graph1"),
        ]
        .into_iter()
        .collect();

        let graph = factory.instantiate(&config).await.unwrap();
        assert!(graph.is_open());
        assert_eq!(graph.name(), Some("graph1"));
    }

    #[tokio::test]
    async fn test_missing_backend_key_fails() {
        let factory = MemoryBackendFactory::new();
        let err = factory.instantiate(&GraphConfig::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::OpenFailure { .. }));
    }

    #[tokio::test]
    async fn test_unknown_backend_fails() {
        let factory = MemoryBackendFactory::new();
        let config: GraphConfig = [(PROPERTY_STORAGE_BACKEND, "bogus")].into_iter().collect();
        let err = factory.instantiate(&config).await.unwrap_err();
        assert!(matches!(err, BackendError::UnknownBackend { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_family_fails_to_open() {
        let factory = MemoryBackendFactory::new();
        let config: GraphConfig = [(PROPERTY_STORAGE_BACKEND, "cassandra")].into_iter().collect();
        let err = factory.instantiate(&config).await.unwrap_err();
        assert!(matches!(err, BackendError::OpenFailure { .. }));
    }
}
