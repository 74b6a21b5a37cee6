//! Name-addressed graph lifecycle operations.

use std::sync::Arc;

use tenantgraph_backend::{BackendFactory, GraphInstance};
use tenantgraph_config::{
    apply_backend_defaults, ConfigError, GraphConfig, PROPERTY_CREATED_USING_TEMPLATE,
    PROPERTY_GRAPH_NAME,
};
use tracing::{info, warn};

use crate::error::ManagementError;
use crate::registry::GraphRegistry;
use crate::store::ConfigurationStore;

/// Creates, opens, and closes graphs by logical name.
///
/// The factory composes the configuration store (what should exist), the
/// registry (what is open), and a backend factory (how to open it). Callers
/// never pass connection parameters; a graph's configuration is persisted
/// once and every later open resolves it by name.
pub struct ConfiguredGraphFactory {
    registry: Arc<GraphRegistry>,
    store: Arc<ConfigurationStore>,
    backends: Arc<dyn BackendFactory>,
}

impl ConfiguredGraphFactory {
    /// Create a factory over the given collaborators.
    pub fn new(
        registry: Arc<GraphRegistry>,
        store: Arc<ConfigurationStore>,
        backends: Arc<dyn BackendFactory>,
    ) -> Self {
        Self {
            registry,
            store,
            backends,
        }
    }

    /// The registry tracking open instances.
    pub fn registry(&self) -> &Arc<GraphRegistry> {
        &self.registry
    }

    /// The configuration store.
    pub fn store(&self) -> &Arc<ConfigurationStore> {
        &self.store
    }

    /// Create a graph named `name` from the template configuration.
    ///
    /// Clones the template, stamps in the graph name and the
    /// created-using-template marker, resolves backend scoping defaults,
    /// persists the configuration, and opens the instance. Fails with
    /// [`ManagementError::DuplicateConfig`] if a configuration already
    /// exists and [`ManagementError::TemplateNotFound`] if no template does.
    ///
    /// If the open fails after the configuration was persisted, the
    /// configuration is removed again so no orphaned record references a
    /// graph that never opened.
    pub async fn create(&self, name: &str) -> Result<Arc<dyn GraphInstance>, ManagementError> {
        if self.store.get_configuration(name).await?.is_some() {
            return Err(ManagementError::duplicate_config(name));
        }
        let mut config = self
            .store
            .get_template_configuration()
            .await?
            .ok_or(ManagementError::TemplateNotFound)?;

        config.insert(PROPERTY_GRAPH_NAME, name);
        config.insert(PROPERTY_CREATED_USING_TEMPLATE, true);
        let config = apply_backend_defaults(name, &config);

        self.store.create_configuration(&config).await?;

        let backends = Arc::clone(&self.backends);
        let result = self
            .registry
            .open_or_create(name, || async move { backends.instantiate(&config).await })
            .await;

        match result {
            Ok(graph) => {
                info!("created graph '{}' from template", name);
                Ok(graph)
            }
            Err(err) => {
                // Compensating rollback: drop the configuration persisted
                // above. Its failure is logged, never returned, so the open
                // error stays visible.
                warn!(
                    "failed to open graph '{}' after persisting its configuration: {}",
                    name, err
                );
                if let Err(cleanup) = self.store.remove_configuration(name).await {
                    warn!(
                        "could not remove configuration for '{}' after failed open: {}",
                        name, cleanup
                    );
                }
                Err(err)
            }
        }
    }

    /// Open the graph named `name` from its persisted configuration.
    ///
    /// Fails with [`ManagementError::ConfigNotFound`] if no configuration
    /// exists. Repeat and concurrent opens of the same name all receive the
    /// same instance.
    pub async fn open(&self, name: &str) -> Result<Arc<dyn GraphInstance>, ManagementError> {
        let config = self
            .store
            .get_configuration(name)
            .await?
            .ok_or_else(|| ManagementError::config_not_found(name))?;
        let config = apply_backend_defaults(name, &config);

        let backends = Arc::clone(&self.backends);
        self.registry
            .open_or_create(name, || async move { backends.instantiate(&config).await })
            .await
    }

    /// Close the graph named `name`, detaching it from the registry.
    ///
    /// Closing an untracked name succeeds silently; the persisted
    /// configuration is left in place.
    pub async fn close(&self, name: &str) -> Result<(), ManagementError> {
        if let Some(graph) = self.registry.remove(name) {
            graph.close().await?;
            info!("closed graph '{}'", name);
        }
        Ok(())
    }

    /// Persist the template configuration used by [`Self::create`].
    pub async fn create_template(&self, config: &GraphConfig) -> Result<(), ManagementError> {
        self.store.create_template_configuration(config).await
    }

    /// Replace the template configuration.
    pub async fn update_template(&self, config: &GraphConfig) -> Result<(), ManagementError> {
        self.store.update_template_configuration(config).await
    }

    /// Remove the template configuration.
    pub async fn remove_template(&self) -> Result<(), ManagementError> {
        self.store.remove_template_configuration().await
    }

    /// The current template configuration, if one exists.
    pub async fn get_template(&self) -> Result<Option<GraphConfig>, ManagementError> {
        self.store.get_template_configuration().await
    }

    /// Persist a configuration for `name` without opening the graph.
    ///
    /// If `config` carries the graph-name property it must agree with
    /// `name`; otherwise the name is stamped in.
    pub async fn create_config(
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
        self.store.create_configuration(&config).await
    }

    /// Replace the configuration persisted for `name`.
    ///
    /// Never propagates to an open instance; only a close followed by an
    /// open observes the new values.
    pub async fn update_config(
        &self,
        name: &str,
        config: &GraphConfig,
    ) -> Result<(), ManagementError> {
        self.store.update_configuration(name, config).await
    }

    /// Remove the configuration persisted for `name`.
    ///
    /// An open instance of the graph stays open; closing is always a
    /// separate, explicit action.
    pub async fn remove_config(&self, name: &str) -> Result<(), ManagementError> {
        self.store.remove_configuration(name).await
    }

    /// The configuration persisted for `name`, if any.
    pub async fn get_config(&self, name: &str) -> Result<Option<GraphConfig>, ManagementError> {
        self.store.get_configuration(name).await
    }
}
