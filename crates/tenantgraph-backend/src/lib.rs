//! TenantGraph Backend - Storage abstraction layer
//!
//! This crate defines the seams between the graph lifecycle layer and the
//! storage engines it manages:
//!
//! - [`GraphInstance`]: a live, opened graph handle producing transactions
//! - [`GraphTransaction`]: a commit/rollback unit over vertex records
//! - [`SchemaManager`]: property-key and composite-index management
//! - [`BackendFactory`]: opens a [`GraphInstance`] from a resolved
//!   configuration
//! - [`IndexStatusWatcher`]: polls an index through its
//!   requested → registered → enabled build phases
//!
//! [`MemoryGraph`] is the in-process reference implementation backing the
//! `inmemory` backend family; production storage adapters live outside this
//! workspace and implement the same traits.

mod error;
mod factory;
mod memory;
mod traits;
mod types;
mod watcher;

pub use error::BackendError;
pub use factory::{BackendFactory, MemoryBackendFactory};
pub use memory::{MemoryGraph, MemoryGraphOptions};
pub use traits::{GraphInstance, GraphTransaction, SchemaManager};
pub use types::{IndexDescriptor, IndexStatus, PropertyKind, VertexId, VertexRecord};
pub use watcher::IndexStatusWatcher;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
