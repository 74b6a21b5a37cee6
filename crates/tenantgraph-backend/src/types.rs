//! Shared types for backend operations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tenantgraph_config::ConfigValue;

/// Identifier of a vertex within one graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Data type of a property key, fixed at schema-definition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// UTF-8 string values
    Text,

    /// Boolean values
    Boolean,

    /// 64-bit integer values
    Integer,

    /// 64-bit floating-point values
    Float,
}

/// Phase of secondary-index construction.
///
/// Writes relying on an index are only trustworthy once it is `Enabled`;
/// a `Requested` index is still being installed across the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// Index creation has been requested but not yet acknowledged everywhere
    Requested,

    /// Index is registered and may be enabled
    Registered,

    /// Index is serving reads and enforcing constraints
    Enabled,
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Registered => "registered",
            Self::Enabled => "enabled",
        };
        f.write_str(s)
    }
}

/// Descriptor of a composite vertex index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name, unique per graph
    pub name: String,

    /// The property key the index covers
    pub property_key: String,

    /// Whether the index enforces a uniqueness constraint
    pub unique: bool,
}

/// A vertex in its raw storage representation.
///
/// Every property cell is a list of values: storage engines may hold more
/// than one value per key, and readers are expected to collapse cells that
/// are logically single-valued.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// Vertex identifier
    pub id: VertexId,

    /// Optional vertex label
    pub label: Option<String>,

    /// Property cells keyed by property name
    pub properties: HashMap<String, Vec<ConfigValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_status_display() {
        assert_eq!(IndexStatus::Requested.to_string(), "requested");
        assert_eq!(IndexStatus::Registered.to_string(), "registered");
        assert_eq!(IndexStatus::Enabled.to_string(), "enabled");
    }

    #[test]
    fn test_vertex_id_display() {
        assert_eq!(VertexId(7).to_string(), "v7");
    }
}
