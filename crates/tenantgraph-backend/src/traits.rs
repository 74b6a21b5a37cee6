//! Graph instance, transaction, and schema trait definitions.
//!
//! These traits are the boundary to the storage engines this layer manages.
//! The lifecycle layer only ever touches a graph through them; concrete
//! adapters (column-family, table, embedded-file) live outside this
//! workspace. [`crate::MemoryGraph`] implements them for the `inmemory`
//! family and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tenantgraph_config::{ConfigValue, GraphConfig, PROPERTY_GRAPH_NAME};

use crate::error::BackendError;
use crate::types::{IndexDescriptor, IndexStatus, PropertyKind, VertexId, VertexRecord};

/// A live, opened graph handle.
///
/// An instance owns one storage connection and exists only between a
/// successful open and an explicit close. All mutation goes through
/// transactions produced by [`GraphInstance::begin`].
#[async_trait]
pub trait GraphInstance: Send + Sync {
    /// The resolved configuration this instance was materialized from.
    fn config(&self) -> &GraphConfig;

    /// The logical graph name carried by the configuration, if any.
    fn name(&self) -> Option<&str> {
        self.config().get_str(PROPERTY_GRAPH_NAME)
    }

    /// Whether the instance is still open.
    fn is_open(&self) -> bool;

    /// Start a new transaction.
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, BackendError>;

    /// Access the schema/index management API.
    fn schema(&self) -> &dyn SchemaManager;

    /// Close the instance, releasing its storage connection.
    ///
    /// Closing is idempotent; operations after a close fail with
    /// [`BackendError::InstanceClosed`].
    async fn close(&self) -> Result<(), BackendError>;
}

/// A commit/rollback unit over vertex records.
///
/// Transactions buffer their mutations; nothing is visible to other
/// transactions until [`GraphTransaction::commit`] succeeds. Dropping a
/// transaction without committing discards its buffered writes.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Add a vertex with the given label and properties.
    async fn add_vertex(
        &mut self,
        label: Option<&str>,
        properties: HashMap<String, ConfigValue>,
    ) -> Result<VertexId, BackendError>;

    /// All vertices whose property cell under `key` contains `value`.
    ///
    /// Reads observe this transaction's own uncommitted writes.
    async fn vertices_by_property(
        &self,
        key: &str,
        value: &ConfigValue,
    ) -> Result<Vec<VertexRecord>, BackendError>;

    /// Remove a vertex; returns whether it existed.
    async fn remove_vertex(&mut self, id: VertexId) -> Result<bool, BackendError>;

    /// Atomically apply all buffered mutations.
    async fn commit(self: Box<Self>) -> Result<(), BackendError>;

    /// Discard all buffered mutations.
    async fn rollback(self: Box<Self>) -> Result<(), BackendError>;
}

/// Property-key and composite-index management for one graph.
#[async_trait]
pub trait SchemaManager: Send + Sync {
    /// Define a property key with a fixed data type. Idempotent for an
    /// identical definition.
    async fn make_property_key(&self, name: &str, kind: PropertyKind)
        -> Result<(), BackendError>;

    /// Look up an index by name.
    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, BackendError>;

    /// Request construction of a composite vertex index over `property_key`.
    ///
    /// The new index starts in [`IndexStatus::Requested`]; registration
    /// completes asynchronously and must be awaited through
    /// [`crate::IndexStatusWatcher`] before the index can be enabled.
    async fn build_index(
        &self,
        name: &str,
        property_key: &str,
        unique: bool,
    ) -> Result<IndexDescriptor, BackendError>;

    /// Current build phase of the index.
    async fn index_status(&self, name: &str) -> Result<IndexStatus, BackendError>;

    /// Move a [`IndexStatus::Registered`] index to [`IndexStatus::Enabled`].
    async fn enable_index(&self, name: &str) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // The traits must stay object-safe; the lifecycle layer holds them as
    // trait objects.
    fn _assert_object_safe(
        _: &dyn GraphInstance,
        _: &dyn GraphTransaction,
        _: &dyn SchemaManager,
    ) {
    }
}
