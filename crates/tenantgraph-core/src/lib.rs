//! TenantGraph Core - Graph instance lifecycle management
//!
//! This crate is the lifecycle layer of a multi-tenant graph database
//! server. It tracks which named graphs are open in the process and
//! creates, opens, updates, and closes graphs by logical name:
//!
//! - [`GraphRegistry`]: concurrency-safe map from name to live instance,
//!   with exactly-once construction per name under concurrent demand
//! - [`ConfigurationStore`]: named configurations and the singleton
//!   template, persisted as vertices inside a dedicated graph instance
//! - [`ConfiguredGraphFactory`]: name-addressed create/open/close composing
//!   the store, the registry, and a storage backend factory
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tenantgraph_backend::{MemoryBackendFactory, MemoryGraph, MemoryGraphOptions};
//! use tenantgraph_config::{GraphConfig, PROPERTY_STORAGE_BACKEND};
//! use tenantgraph_core::{ConfigurationStore, ConfiguredGraphFactory, GraphRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The store persists configurations inside a graph it manages itself.
//!     let config_graph = Arc::new(MemoryGraph::open(
//!         GraphConfig::new(),
//!         MemoryGraphOptions::default(),
//!     ));
//!     let store = Arc::new(ConfigurationStore::new(config_graph));
//!     store.initialize().await?;
//!
//!     let factory = ConfiguredGraphFactory::new(
//!         Arc::new(GraphRegistry::new()),
//!         store,
//!         Arc::new(MemoryBackendFactory::new()),
//!     );
//!
//!     let template: GraphConfig =
//!         [(PROPERTY_STORAGE_BACKEND, "inmemory")].into_iter().collect();
//!     factory.create_template(&template).await?;
//!
//!     let graph = factory.create("tenant-a").await?;
//!     assert!(graph.is_open());
//!     factory.close("tenant-a").await?;
//!     Ok(())
//! }
//! ```

mod error;
mod factory;
mod registry;
mod store;

pub use error::ManagementError;
pub use factory::ConfiguredGraphFactory;
pub use registry::GraphRegistry;
pub use store::{
    ConfigurationStore, IndexWatchConfig, CONFIG_VERTEX_LABEL, CREATED_USING_TEMPLATE_INDEX,
    GRAPH_NAME_INDEX, TEMPLATE_INDEX,
};

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, ManagementError>;
