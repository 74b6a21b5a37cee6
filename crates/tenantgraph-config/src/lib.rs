//! TenantGraph Configuration Model
//!
//! Provides the building blocks every other TenantGraph crate works with:
//! - [`GraphConfig`]: a string-keyed map of scalar-or-list values describing
//!   how to open one graph instance
//! - [`BackendFamily`]: the classes of storage engines sharing a
//!   scoping-value convention (keyspace, table, or directory)
//! - [`resolve`] / [`apply_backend_defaults`]: pure derivation of
//!   backend-specific scoping defaults from a graph name
//!
//! This crate is deliberately free of async code and I/O; it only models
//! configuration data and the rules applied to it.

mod backend;
mod error;
mod resolver;

pub use backend::BackendFamily;
pub use error::ConfigError;
pub use resolver::{apply_backend_defaults, resolve};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Property key holding a graph's logical name on a persisted configuration.
pub const PROPERTY_GRAPH_NAME: &str = "graph.name";

/// Boolean marker flagging the singleton template configuration record.
pub const PROPERTY_TEMPLATE: &str = "template";

/// Boolean marker stamped onto configurations created from the template.
pub const PROPERTY_CREATED_USING_TEMPLATE: &str = "created.using.template";

/// Backend shorthand selecting the backend family (e.g. `"cassandra"`).
pub const PROPERTY_STORAGE_BACKEND: &str = "storage.backend";

/// Column-family scoping value for cassandra-style backends.
pub const PROPERTY_CASSANDRA_KEYSPACE: &str = "storage.cassandra.keyspace";

/// Table scoping value for hbase-style backends.
pub const PROPERTY_HBASE_TABLE: &str = "storage.hbase.table";

/// Directory scoping value for embedded-file backends.
pub const PROPERTY_STORAGE_DIRECTORY: &str = "storage.directory";

/// Root directory that per-graph storage directories are derived from.
pub const PROPERTY_STORAGE_ROOT: &str = "storage.root";

/// A single configuration value: a scalar or a homogeneous list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean value
    Bool(bool),

    /// Integer value
    Int(i64),

    /// Floating-point value
    Float(f64),

    /// String value
    String(String),

    /// List of values
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Return the string slice if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the boolean if this value is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the integer if this value is an int.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Return the float if this value is a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        Self::List(value)
    }
}

/// Configuration for one graph instance.
///
/// A `GraphConfig` is an ordered map of property keys to [`ConfigValue`]s.
/// Persisted configurations carry the graph's name under
/// [`PROPERTY_GRAPH_NAME`]; the singleton template configuration instead
/// carries the [`PROPERTY_TEMPLATE`] marker and no name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl GraphConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Look up a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(ConfigValue::as_str)
    }

    /// Look up a boolean value by key.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(ConfigValue::as_bool)
    }

    /// Whether the configuration contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.remove(key)
    }

    /// The graph name carried under [`PROPERTY_GRAPH_NAME`], if any.
    pub fn graph_name(&self) -> Option<&str> {
        self.get_str(PROPERTY_GRAPH_NAME)
    }

    /// The backend family selected by [`PROPERTY_STORAGE_BACKEND`], if the
    /// shorthand is recognized.
    pub fn backend_family(&self) -> Option<BackendFamily> {
        self.get_str(PROPERTY_STORAGE_BACKEND)
            .and_then(BackendFamily::from_shorthand)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for GraphConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for GraphConfig {
    type Item = (String, ConfigValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
