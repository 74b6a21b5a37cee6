//! In-memory graph backend.
//!
//! Backing store for the `inmemory` backend family and the reference
//! implementation the test suites run against. Vertices live in a
//! `parking_lot`-guarded map; transactions buffer their mutations and apply
//! them atomically on commit, so a failed commit leaves no partial state.
//!
//! Index registration completes asynchronously after a configurable delay so
//! callers exercising the requested → registered → enabled state machine poll
//! against real phase transitions rather than an always-ready stub.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tenantgraph_config::{ConfigValue, GraphConfig};
use tracing::debug;

use crate::error::BackendError;
use crate::traits::{GraphInstance, GraphTransaction, SchemaManager};
use crate::types::{IndexDescriptor, IndexStatus, PropertyKind, VertexId, VertexRecord};

/// Tuning knobs for [`MemoryGraph`].
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphOptions {
    /// How long a freshly built index stays in `Requested` before it
    /// registers. Zero registers on the first status read.
    pub index_registration_delay: Duration,
}

#[derive(Debug, Clone)]
struct StoredVertex {
    label: Option<String>,
    properties: HashMap<String, Vec<ConfigValue>>,
}

#[derive(Debug)]
struct IndexState {
    descriptor: IndexDescriptor,
    status: IndexStatus,
    built_at: Instant,
}

#[derive(Default)]
struct MemoryState {
    vertices: HashMap<VertexId, StoredVertex>,
    property_keys: HashMap<String, PropertyKind>,
    indexes: HashMap<String, IndexState>,
    next_id: u64,
    closed: bool,
}

fn ensure_open(state: &MemoryState) -> Result<(), BackendError> {
    if state.closed {
        Err(BackendError::InstanceClosed)
    } else {
        Ok(())
    }
}

fn cell_contains(
    properties: &HashMap<String, Vec<ConfigValue>>,
    key: &str,
    value: &ConfigValue,
) -> bool {
    properties
        .get(key)
        .is_some_and(|cell| cell.iter().any(|v| v == value))
}

fn to_record(id: VertexId, vertex: &StoredVertex) -> VertexRecord {
    VertexRecord {
        id,
        label: vertex.label.clone(),
        properties: vertex.properties.clone(),
    }
}

/// An in-memory graph instance.
pub struct MemoryGraph {
    config: GraphConfig,
    state: Arc<RwLock<MemoryState>>,
    schema: MemorySchema,
}

impl MemoryGraph {
    /// Open a fresh, empty in-memory graph for `config`.
    pub fn open(config: GraphConfig, options: MemoryGraphOptions) -> Self {
        let state = Arc::new(RwLock::new(MemoryState::default()));
        let schema = MemorySchema {
            state: Arc::clone(&state),
            options,
        };
        debug!(
            "opened in-memory graph{}",
            config
                .graph_name()
                .map(|n| format!(" '{n}'"))
                .unwrap_or_default()
        );
        Self {
            config,
            state,
            schema,
        }
    }
}

#[async_trait]
impl GraphInstance for MemoryGraph {
    fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn is_open(&self) -> bool {
        !self.state.read().closed
    }

    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, BackendError> {
        ensure_open(&self.state.read())?;
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            added: Vec::new(),
            removed: HashSet::new(),
        }))
    }

    fn schema(&self) -> &dyn SchemaManager {
        &self.schema
    }

    async fn close(&self) -> Result<(), BackendError> {
        let mut state = self.state.write();
        if !state.closed {
            state.closed = true;
            debug!(
                "closed in-memory graph{}",
                self.config
                    .graph_name()
                    .map(|n| format!(" '{n}'"))
                    .unwrap_or_default()
            );
        }
        Ok(())
    }
}

struct MemorySchema {
    state: Arc<RwLock<MemoryState>>,
    options: MemoryGraphOptions,
}

impl MemorySchema {
    /// Reads the index phase, completing a pending registration whose delay
    /// has elapsed.
    fn current_status(&self, name: &str) -> Result<IndexStatus, BackendError> {
        let mut state = self.state.write();
        ensure_open(&state)?;
        let delay = self.options.index_registration_delay;
        let index = state
            .indexes
            .get_mut(name)
            .ok_or_else(|| BackendError::index_not_found(name))?;
        if index.status == IndexStatus::Requested && index.built_at.elapsed() >= delay {
            index.status = IndexStatus::Registered;
        }
        Ok(index.status)
    }
}

#[async_trait]
impl SchemaManager for MemorySchema {
    async fn make_property_key(
        &self,
        name: &str,
        kind: PropertyKind,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write();
        ensure_open(&state)?;
        match state.property_keys.get(name) {
            Some(existing) if *existing != kind => Err(BackendError::internal(format!(
                "property key '{name}' already defined with a different type"
            ))),
            Some(_) => Ok(()),
            None => {
                state.property_keys.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, BackendError> {
        let state = self.state.read();
        ensure_open(&state)?;
        Ok(state.indexes.get(name).map(|i| i.descriptor.clone()))
    }

    async fn build_index(
        &self,
        name: &str,
        property_key: &str,
        unique: bool,
    ) -> Result<IndexDescriptor, BackendError> {
        let mut state = self.state.write();
        ensure_open(&state)?;
        if !state.property_keys.contains_key(property_key) {
            return Err(BackendError::unknown_property_key(property_key));
        }

        let descriptor = IndexDescriptor {
            name: name.to_string(),
            property_key: property_key.to_string(),
            unique,
        };
        if let Some(existing) = state.indexes.get(name) {
            if existing.descriptor == descriptor {
                return Ok(descriptor);
            }
            return Err(BackendError::internal(format!(
                "index '{name}' already exists with a different definition"
            )));
        }

        debug!("building index '{}' over '{}'", name, property_key);
        state.indexes.insert(
            name.to_string(),
            IndexState {
                descriptor: descriptor.clone(),
                status: IndexStatus::Requested,
                built_at: Instant::now(),
            },
        );
        Ok(descriptor)
    }

    async fn index_status(&self, name: &str) -> Result<IndexStatus, BackendError> {
        self.current_status(name)
    }

    async fn enable_index(&self, name: &str) -> Result<(), BackendError> {
        let status = self.current_status(name)?;
        let mut state = self.state.write();
        let index = state
            .indexes
            .get_mut(name)
            .ok_or_else(|| BackendError::index_not_found(name))?;
        match status {
            IndexStatus::Enabled => Ok(()),
            IndexStatus::Registered => {
                index.status = IndexStatus::Enabled;
                debug!("enabled index '{}'", name);
                Ok(())
            }
            IndexStatus::Requested => Err(BackendError::IllegalIndexTransition {
                name: name.to_string(),
                from: IndexStatus::Requested,
                to: IndexStatus::Enabled,
            }),
        }
    }
}

struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    added: Vec<(VertexId, StoredVertex)>,
    removed: HashSet<VertexId>,
}

impl MemoryTransaction {
    fn check_unique_constraints(&self, state: &MemoryState) -> Result<(), BackendError> {
        for (id, vertex) in &self.added {
            for index in state.indexes.values() {
                if !index.descriptor.unique {
                    continue;
                }
                let key = &index.descriptor.property_key;
                let Some(values) = vertex.properties.get(key) else {
                    continue;
                };

                let clashes_committed = state.vertices.iter().any(|(vid, v)| {
                    !self.removed.contains(vid)
                        && v.properties
                            .get(key)
                            .is_some_and(|cell| cell.iter().any(|c| values.contains(c)))
                });
                let clashes_buffered = self.added.iter().any(|(other_id, other)| {
                    other_id != id
                        && other
                            .properties
                            .get(key)
                            .is_some_and(|cell| cell.iter().any(|c| values.contains(c)))
                });
                if clashes_committed || clashes_buffered {
                    return Err(BackendError::unique_constraint(&index.descriptor.name, key));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn add_vertex(
        &mut self,
        label: Option<&str>,
        properties: HashMap<String, ConfigValue>,
    ) -> Result<VertexId, BackendError> {
        let id = {
            let mut state = self.state.write();
            ensure_open(&state)?;
            state.next_id += 1;
            VertexId(state.next_id)
        };
        let properties = properties.into_iter().map(|(k, v)| (k, vec![v])).collect();
        self.added.push((
            id,
            StoredVertex {
                label: label.map(str::to_string),
                properties,
            },
        ));
        Ok(id)
    }

    async fn vertices_by_property(
        &self,
        key: &str,
        value: &ConfigValue,
    ) -> Result<Vec<VertexRecord>, BackendError> {
        let state = self.state.read();
        ensure_open(&state)?;

        let mut records: Vec<VertexRecord> = state
            .vertices
            .iter()
            .filter(|(id, _)| !self.removed.contains(id))
            .filter(|(_, v)| cell_contains(&v.properties, key, value))
            .map(|(id, v)| to_record(*id, v))
            .collect();
        records.extend(
            self.added
                .iter()
                .filter(|(_, v)| cell_contains(&v.properties, key, value))
                .map(|(id, v)| to_record(*id, v)),
        );
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn remove_vertex(&mut self, id: VertexId) -> Result<bool, BackendError> {
        if let Some(position) = self.added.iter().position(|(vid, _)| *vid == id) {
            self.added.remove(position);
            return Ok(true);
        }

        let state = self.state.read();
        ensure_open(&state)?;
        if state.vertices.contains_key(&id) && !self.removed.contains(&id) {
            drop(state);
            self.removed.insert(id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn commit(mut self: Box<Self>) -> Result<(), BackendError> {
        let mut state = self.state.write();
        ensure_open(&state)?;
        self.check_unique_constraints(&state)?;

        for id in self.removed.drain() {
            state.vertices.remove(&id);
        }
        for (id, vertex) in self.added.drain(..) {
            state.vertices.insert(id, vertex);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BackendError> {
        // Buffered mutations are simply discarded.
        Ok(())
    }
}
