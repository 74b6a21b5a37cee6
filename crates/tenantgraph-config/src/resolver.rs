//! Backend scoping-default resolution.
//!
//! When a configuration does not pin its backend's scoping value, the value
//! is derived from the graph name: keyspace/table-style backends use the name
//! verbatim, directory-style backends append the name to the configured
//! storage root. Already-present values are never overridden, so resolution
//! is idempotent and safe to re-run on every open.

use tracing::debug;

use crate::{
    BackendFamily, GraphConfig, PROPERTY_STORAGE_DIRECTORY, PROPERTY_STORAGE_ROOT,
};

/// Derive backend scoping defaults for `graph_name` into a copy of `config`.
///
/// Pure: the input configuration is not mutated. A scoping value already
/// present in `config` is kept as-is.
pub fn resolve(family: BackendFamily, graph_name: &str, config: &GraphConfig) -> GraphConfig {
    let mut resolved = config.clone();

    match family {
        BackendFamily::Cassandra | BackendFamily::Hbase => {
            let key = match family.scoping_key() {
                Some(key) => key,
                None => return resolved,
            };
            if !resolved.contains_key(key) {
                debug!("defaulting {} to graph name '{}'", key, graph_name);
                resolved.insert(key, graph_name);
            }
        }
        BackendFamily::Berkeley => {
            if !resolved.contains_key(PROPERTY_STORAGE_DIRECTORY) {
                // Only derivable when a storage root is configured.
                if let Some(root) = resolved.get_str(PROPERTY_STORAGE_ROOT) {
                    let directory = format!("{root}/{graph_name}");
                    debug!(
                        "defaulting {} to '{}'",
                        PROPERTY_STORAGE_DIRECTORY, directory
                    );
                    resolved.insert(PROPERTY_STORAGE_DIRECTORY, directory);
                }
            }
        }
        BackendFamily::Memory => {}
    }

    resolved
}

/// Derive scoping defaults using the family named by the configuration's own
/// `storage.backend` property.
///
/// Unrecognized or missing shorthands leave the configuration untouched;
/// the backend factory reports those when the graph is actually opened.
pub fn apply_backend_defaults(graph_name: &str, config: &GraphConfig) -> GraphConfig {
    match config.backend_family() {
        Some(family) => resolve(family, graph_name, config),
        None => config.clone(),
    }
}
