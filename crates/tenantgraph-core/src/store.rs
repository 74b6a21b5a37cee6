//! Configuration store backed by a graph instance.
//!
//! Named configurations and the singleton template are persisted as vertices
//! inside a dedicated graph that this layer itself manages. Each named
//! configuration is one labeled vertex whose properties are the
//! configuration entries; the template is an unlabeled vertex flagged by a
//! boolean marker property. Point lookups ride two composite indices (a
//! unique one on the graph name, a non-unique one on the template marker).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tenantgraph_backend::{
    GraphInstance, GraphTransaction, IndexStatus, IndexStatusWatcher, PropertyKind, VertexRecord,
};
use tenantgraph_config::{
    ConfigError, ConfigValue, GraphConfig, PROPERTY_CREATED_USING_TEMPLATE, PROPERTY_GRAPH_NAME,
    PROPERTY_TEMPLATE,
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::error::ManagementError;

/// Vertex label carried by persisted named configurations.
pub const CONFIG_VERTEX_LABEL: &str = "Configuration";

/// Unique index over the graph-name property.
pub const GRAPH_NAME_INDEX: &str = "graph-name-index";

/// Non-unique index over the template marker.
pub const TEMPLATE_INDEX: &str = "template-index";

/// Non-unique index over the created-using-template marker.
pub const CREATED_USING_TEMPLATE_INDEX: &str = "created-using-template-index";

/// Polling parameters for awaiting index builds.
#[derive(Debug, Clone)]
pub struct IndexWatchConfig {
    /// Maximum wall-clock wait for an index to register; `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,

    /// Interval between status reads.
    pub poll_interval: Duration,
}

impl Default for IndexWatchConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl IndexWatchConfig {
    /// Build from whole seconds and milliseconds; a negative timeout means
    /// wait indefinitely.
    pub fn from_secs(timeout_secs: i64, poll_millis: u64) -> Self {
        Self {
            timeout: u64::try_from(timeout_secs).ok().map(Duration::from_secs),
            poll_interval: Duration::from_millis(poll_millis),
        }
    }
}

/// Durable, indexed storage of named configurations and the template.
///
/// Constructed once at process bootstrap around the dedicated configuration
/// graph and shared by handle; there is no hidden global instance.
pub struct ConfigurationStore {
    graph: Arc<dyn GraphInstance>,
    watch: IndexWatchConfig,

    /// Collapses concurrent initialize() calls into one schema pass.
    init: OnceCell<()>,

    /// Serializes mutating operations so existence checks and their writes
    /// form one logical unit.
    write_lock: Mutex<()>,
}

impl ConfigurationStore {
    /// Create a store over the dedicated configuration graph.
    pub fn new(graph: Arc<dyn GraphInstance>) -> Self {
        Self::with_watch_config(graph, IndexWatchConfig::default())
    }

    /// Create a store with custom index-build polling parameters.
    pub fn with_watch_config(graph: Arc<dyn GraphInstance>, watch: IndexWatchConfig) -> Self {
        Self {
            graph,
            watch,
            init: OnceCell::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Idempotently ensure the store's indices exist and are enabled.
    ///
    /// Creates the unique graph-name index, the template-marker index, and
    /// the created-using-template index, awaiting each index's registration
    /// with the configured timeout. Concurrent calls collapse into a single
    /// schema pass; a failed pass leaves the store uninitialized so a later
    /// call can retry.
    pub async fn initialize(&self) -> Result<(), ManagementError> {
        self.init
            .get_or_try_init(|| async {
                self.ensure_index(
                    GRAPH_NAME_INDEX,
                    PROPERTY_GRAPH_NAME,
                    PropertyKind::Text,
                    true,
                )
                .await?;
                self.ensure_index(
                    TEMPLATE_INDEX,
                    PROPERTY_TEMPLATE,
                    PropertyKind::Boolean,
                    false,
                )
                .await?;
                self.ensure_index(
                    CREATED_USING_TEMPLATE_INDEX,
                    PROPERTY_CREATED_USING_TEMPLATE,
                    PropertyKind::Boolean,
                    false,
                )
                .await?;
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Build `index_name` over `property_key` if absent, then walk it to
    /// `Enabled`, polling through the registration phase.
    async fn ensure_index(
        &self,
        index_name: &str,
        property_key: &str,
        kind: PropertyKind,
        unique: bool,
    ) -> Result<(), ManagementError> {
        let schema = self.graph.schema();

        if schema.get_index(index_name).await?.is_none() {
            schema.make_property_key(property_key, kind).await?;
            schema.build_index(index_name, property_key, unique).await?;
        }

        match schema.index_status(index_name).await? {
            IndexStatus::Enabled => {}
            IndexStatus::Registered => {
                schema.enable_index(index_name).await?;
            }
            IndexStatus::Requested => {
                IndexStatusWatcher::new(schema, index_name)
                    .status(&[IndexStatus::Registered, IndexStatus::Enabled])
                    .timeout(self.watch.timeout)
                    .poll_interval(self.watch.poll_interval)
                    .call()
                    .await?;
                if schema.index_status(index_name).await? != IndexStatus::Enabled {
                    schema.enable_index(index_name).await?;
                }
            }
        }
        debug!("index '{}' ready", index_name);
        Ok(())
    }

    /// Persist a named configuration.
    ///
    /// The configuration must carry the graph-name property; at most one
    /// configuration may exist per name.
    pub async fn create_configuration(&self, config: &GraphConfig) -> Result<(), ManagementError> {
        let name = config
            .graph_name()
            .ok_or_else(|| ConfigError::missing_key(PROPERTY_GRAPH_NAME))?
            .to_string();

        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_GRAPH_NAME, &ConfigValue::from(name.as_str()))
            .await?;
        if !existing.is_empty() {
            rollback_quietly(tx).await;
            return Err(ManagementError::duplicate_config(name));
        }

        tx.add_vertex(Some(CONFIG_VERTEX_LABEL), to_properties(config))
            .await?;
        tx.commit().await?;
        debug!("persisted configuration for graph '{}'", name);
        Ok(())
    }

    /// Persist the singleton template configuration.
    ///
    /// The template may not carry the graph-name property, and only one
    /// template may exist.
    pub async fn create_template_configuration(
        &self,
        config: &GraphConfig,
    ) -> Result<(), ManagementError> {
        if config.contains_key(PROPERTY_GRAPH_NAME) {
            return Err(ConfigError::template_mutation(PROPERTY_GRAPH_NAME).into());
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_TEMPLATE, &ConfigValue::Bool(true))
            .await?;
        if !existing.is_empty() {
            rollback_quietly(tx).await;
            return Err(ManagementError::DuplicateTemplate);
        }

        let mut properties = to_properties(config);
        properties.insert(PROPERTY_TEMPLATE.to_string(), ConfigValue::Bool(true));
        tx.add_vertex(None, properties).await?;
        tx.commit().await?;
        debug!("persisted template configuration");
        Ok(())
    }

    /// Look up the configuration persisted for `name`.
    pub async fn get_configuration(
        &self,
        name: &str,
    ) -> Result<Option<GraphConfig>, ManagementError> {
        let tx = self.graph.begin().await?;
        let records = tx
            .vertices_by_property(PROPERTY_GRAPH_NAME, &ConfigValue::from(name))
            .await?;
        rollback_quietly(tx).await;

        match records.as_slice() {
            [] => Ok(None),
            [record] => Ok(Some(record_to_config(record))),
            _ => Err(ManagementError::store_corruption(format!(
                "found {} configurations named '{}'; the unique graph-name index is violated",
                records.len(),
                name
            ))),
        }
    }

    /// Look up the template configuration, with its marker property
    /// stripped.
    pub async fn get_template_configuration(
        &self,
    ) -> Result<Option<GraphConfig>, ManagementError> {
        let tx = self.graph.begin().await?;
        let records = tx
            .vertices_by_property(PROPERTY_TEMPLATE, &ConfigValue::Bool(true))
            .await?;
        rollback_quietly(tx).await;

        match records.as_slice() {
            [] => Ok(None),
            [record] => {
                let mut config = record_to_config(record);
                config.remove(PROPERTY_TEMPLATE);
                Ok(Some(config))
            }
            _ => Err(ManagementError::store_corruption(format!(
                "found {} template configurations; only one may exist",
                records.len()
            ))),
        }
    }

    /// Replace the configuration persisted for `name`.
    ///
    /// Full-replace semantics: the previous record is deleted and the new
    /// one written inside a single transaction. If `config` carries the
    /// graph-name property it must agree with `name`; otherwise the name is
    /// stamped in. An open instance of the graph is unaffected until it is
    /// closed and reopened.
    pub async fn update_configuration(
        &self,
        name: &str,
        config: &GraphConfig,
    ) -> Result<(), ManagementError> {
        let mut config = config.clone();
        let configured = config.graph_name().map(str::to_string);
        match configured.as_deref() {
            Some(configured) if configured != name => {
                return Err(ConfigError::name_mismatch(name, configured).into());
            }
            Some(_) => {}
            None => config.insert(PROPERTY_GRAPH_NAME, name),
        }

        warn!(
            "updated configuration for graph '{}' only takes effect once the graph is closed and reopened",
            name
        );

        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_GRAPH_NAME, &ConfigValue::from(name))
            .await?;
        for record in existing {
            tx.remove_vertex(record.id).await?;
        }
        tx.add_vertex(Some(CONFIG_VERTEX_LABEL), to_properties(&config))
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the template configuration.
    ///
    /// Full-replace semantics in a single transaction. Graphs already
    /// created from the previous template keep their configurations.
    pub async fn update_template_configuration(
        &self,
        config: &GraphConfig,
    ) -> Result<(), ManagementError> {
        if config.contains_key(PROPERTY_GRAPH_NAME) {
            return Err(ConfigError::template_mutation(PROPERTY_GRAPH_NAME).into());
        }

        warn!(
            "graphs created from the template keep their configurations; the updated template only \
             affects graphs created after this point"
        );

        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_TEMPLATE, &ConfigValue::Bool(true))
            .await?;
        for record in existing {
            tx.remove_vertex(record.id).await?;
        }
        let mut properties = to_properties(config);
        properties.insert(PROPERTY_TEMPLATE.to_string(), ConfigValue::Bool(true));
        tx.add_vertex(None, properties).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete the configuration persisted for `name`. Absence is not an
    /// error.
    pub async fn remove_configuration(&self, name: &str) -> Result<(), ManagementError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_GRAPH_NAME, &ConfigValue::from(name))
            .await?;
        if existing.is_empty() {
            rollback_quietly(tx).await;
            return Ok(());
        }
        for record in existing {
            tx.remove_vertex(record.id).await?;
        }
        tx.commit().await?;
        debug!("removed configuration for graph '{}'", name);
        Ok(())
    }

    /// Delete the template configuration. Absence is not an error.
    pub async fn remove_template_configuration(&self) -> Result<(), ManagementError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.graph.begin().await?;
        let existing = tx
            .vertices_by_property(PROPERTY_TEMPLATE, &ConfigValue::Bool(true))
            .await?;
        if existing.is_empty() {
            rollback_quietly(tx).await;
            return Ok(());
        }
        for record in existing {
            tx.remove_vertex(record.id).await?;
        }
        tx.commit().await?;
        debug!("removed template configuration");
        Ok(())
    }
}

/// Flatten a vertex record's multi-valued cells into a configuration.
///
/// Storage engines report every property as a list; logically single-valued
/// cells with more than one element indicate a degraded store, so the extra
/// values are dropped with a warning.
fn record_to_config(record: &VertexRecord) -> GraphConfig {
    let mut config = GraphConfig::new();
    for (key, cell) in &record.properties {
        match cell.as_slice() {
            [] => {}
            [value] => config.insert(key.clone(), value.clone()),
            [first, ..] => {
                warn!(
                    "property '{}' on vertex {} holds {} values; keeping the first",
                    key,
                    record.id,
                    cell.len()
                );
                config.insert(key.clone(), first.clone());
            }
        }
    }
    config
}

fn to_properties(config: &GraphConfig) -> HashMap<String, ConfigValue> {
    config.clone().into_iter().collect()
}

async fn rollback_quietly(tx: Box<dyn GraphTransaction>) {
    if let Err(err) = tx.rollback().await {
        warn!("transaction rollback failed: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenantgraph_backend::{BackendError, MemoryGraph, MemoryGraphOptions};
    use tenantgraph_config::PROPERTY_STORAGE_BACKEND;

    fn config_graph() -> Arc<dyn GraphInstance> {
        Arc::new(MemoryGraph::open(
            GraphConfig::new(),
            MemoryGraphOptions::default(),
        ))
    }

    async fn initialized_store() -> ConfigurationStore {
        let store = ConfigurationStore::with_watch_config(
            config_graph(),
            IndexWatchConfig::from_secs(10, 5),
        );
        store.initialize().await.unwrap();
        store
    }

    fn named_config(name: &str) -> GraphConfig {
        [
            (PROPERTY_GRAPH_NAME, ConfigValue::from(name)),
            (PROPERTY_STORAGE_BACKEND, ConfigValue::from("inmemory")),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = initialized_store().await;
        store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap();

        let config = store.get_configuration("graph1").await.unwrap().unwrap();
        assert_eq!(config.graph_name(), Some("graph1"));
        assert_eq!(config.get_str(PROPERTY_STORAGE_BACKEND), Some("inmemory"));

        assert!(store.get_configuration("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_graph_name() {
        let store = initialized_store().await;
        let config: GraphConfig = [(PROPERTY_STORAGE_BACKEND, "inmemory")].into_iter().collect();

        let err = store.create_configuration(&config).await.unwrap_err();
        assert!(matches!(
            err,
            ManagementError::Config(ConfigError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_configuration_rejected() {
        let store = initialized_store().await;
        store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap();

        let err = store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ManagementError::DuplicateConfig { .. }));
    }

    #[tokio::test]
    async fn test_template_round_trip_strips_marker() {
        let store = initialized_store().await;
        let template: GraphConfig =
            [(PROPERTY_STORAGE_BACKEND, "inmemory")].into_iter().collect();
        store
            .create_template_configuration(&template)
            .await
            .unwrap();

        let fetched = store.get_template_configuration().await.unwrap().unwrap();
        assert_eq!(fetched, template);
        assert!(!fetched.contains_key(PROPERTY_TEMPLATE));
    }

    #[tokio::test]
    async fn test_template_may_not_carry_graph_name() {
        let store = initialized_store().await;
        let err = store
            .create_template_configuration(&named_config("graph1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ManagementError::Config(ConfigError::InvalidTemplateMutation { .. })
        ));
    }

    #[tokio::test]
    async fn test_second_template_rejected() {
        let store = initialized_store().await;
        let template: GraphConfig =
            [(PROPERTY_STORAGE_BACKEND, "inmemory")].into_iter().collect();
        store
            .create_template_configuration(&template)
            .await
            .unwrap();

        let err = store
            .create_template_configuration(&template)
            .await
            .unwrap_err();
        assert!(matches!(err, ManagementError::DuplicateTemplate));
    }

    #[tokio::test]
    async fn test_update_fully_replaces() {
        let store = initialized_store().await;
        let mut original = named_config("graph1");
        original.insert("cache.size", 256i64);
        store.create_configuration(&original).await.unwrap();

        let replacement = named_config("graph1");
        store
            .update_configuration("graph1", &replacement)
            .await
            .unwrap();

        let fetched = store.get_configuration("graph1").await.unwrap().unwrap();
        // Full-replace: the old cache.size entry is gone.
        assert!(!fetched.contains_key("cache.size"));
        assert_eq!(fetched, replacement);
    }

    #[tokio::test]
    async fn test_update_stamps_missing_name() {
        let store = initialized_store().await;
        store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap();

        let unnamed: GraphConfig =
            [(PROPERTY_STORAGE_BACKEND, "berkeleyje")].into_iter().collect();
        store.update_configuration("graph1", &unnamed).await.unwrap();

        let fetched = store.get_configuration("graph1").await.unwrap().unwrap();
        assert_eq!(fetched.graph_name(), Some("graph1"));
        assert_eq!(fetched.get_str(PROPERTY_STORAGE_BACKEND), Some("berkeleyje"));
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_name() {
        let store = initialized_store().await;
        store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap();

        let err = store
            .update_configuration("graph1", &named_config("graph2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ManagementError::Config(ConfigError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_template_replaces_singleton() {
        let store = initialized_store().await;
        let template: GraphConfig =
            [(PROPERTY_STORAGE_BACKEND, "inmemory")].into_iter().collect();
        store
            .create_template_configuration(&template)
            .await
            .unwrap();

        let replacement: GraphConfig =
            [(PROPERTY_STORAGE_BACKEND, "berkeleyje")].into_iter().collect();
        store
            .update_template_configuration(&replacement)
            .await
            .unwrap();

        let fetched = store.get_template_configuration().await.unwrap().unwrap();
        assert_eq!(fetched, replacement);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = initialized_store().await;
        store
            .create_configuration(&named_config("graph1"))
            .await
            .unwrap();

        store.remove_configuration("graph1").await.unwrap();
        assert!(store.get_configuration("graph1").await.unwrap().is_none());
        // Removing again is not an error.
        store.remove_configuration("graph1").await.unwrap();

        store.remove_template_configuration().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_and_concurrent() {
        let store = Arc::new(ConfigurationStore::with_watch_config(
            config_graph(),
            IndexWatchConfig::from_secs(10, 5),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.initialize().await })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        // All three indices exist and are enabled.
        let schema = store.graph.schema();
        for index in [GRAPH_NAME_INDEX, TEMPLATE_INDEX, CREATED_USING_TEMPLATE_INDEX] {
            assert_eq!(
                schema.index_status(index).await.unwrap(),
                IndexStatus::Enabled
            );
        }

        store.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_times_out_on_slow_registration() {
        let graph: Arc<dyn GraphInstance> = Arc::new(MemoryGraph::open(
            GraphConfig::new(),
            MemoryGraphOptions {
                index_registration_delay: Duration::from_secs(60),
            },
        ));
        let store = ConfigurationStore::with_watch_config(
            graph,
            IndexWatchConfig {
                timeout: Some(Duration::from_millis(50)),
                poll_interval: Duration::from_millis(10),
            },
        );

        let err = store.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            ManagementError::Backend(BackendError::IndexBuildTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_multiple_matches_fail_loudly() {
        // Bypass the store to plant two records under one name, as a
        // corrupted unique index would.
        let graph = config_graph();
        for _ in 0..2 {
            let mut tx = graph.begin().await.unwrap();
            tx.add_vertex(
                Some(CONFIG_VERTEX_LABEL),
                [(PROPERTY_GRAPH_NAME.to_string(), ConfigValue::from("graph1"))]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }

        let store = ConfigurationStore::new(graph);
        let err = store.get_configuration("graph1").await.unwrap_err();
        assert!(matches!(err, ManagementError::StoreCorruption { .. }));
    }

    #[tokio::test]
    async fn test_multivalued_cell_collapses_to_scalar() {
        // A record whose cell holds several values deserializes to the
        // first one.
        let record = VertexRecord {
            id: tenantgraph_backend::VertexId(1),
            label: Some(CONFIG_VERTEX_LABEL.to_string()),
            properties: [(
                PROPERTY_STORAGE_BACKEND.to_string(),
                vec![ConfigValue::from("inmemory"), ConfigValue::from("hbase")],
            )]
            .into_iter()
            .collect(),
        };

        let config = record_to_config(&record);
        assert_eq!(config.get_str(PROPERTY_STORAGE_BACKEND), Some("inmemory"));
    }
}
