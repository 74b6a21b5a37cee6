//! Backend families and their shorthand table.
//!
//! A backend family is a class of storage engines sharing a scoping-value
//! convention: column-family stores scope graphs by keyspace, table stores by
//! table, embedded-file stores by directory. The `storage.backend` property
//! selects a family through one of its shorthands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PROPERTY_CASSANDRA_KEYSPACE, PROPERTY_HBASE_TABLE, PROPERTY_STORAGE_DIRECTORY};

/// Class of storage engines sharing a scoping-value convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFamily {
    /// Column-family stores scoped by keyspace
    Cassandra,

    /// Wide-table stores scoped by table name
    Hbase,

    /// Embedded-file stores scoped by directory
    Berkeley,

    /// Process-local in-memory store; needs no scoping value
    Memory,
}

impl BackendFamily {
    /// Resolve a `storage.backend` shorthand to its family.
    ///
    /// Returns `None` for unrecognized shorthands; callers decide whether
    /// that is an error (opening a backend) or a no-op (deriving defaults).
    pub fn from_shorthand(shorthand: &str) -> Option<Self> {
        match shorthand {
            "cassandra" | "cassandrathrift" | "astyanax" | "embeddedcassandra" => {
                Some(Self::Cassandra)
            }
            "hbase" => Some(Self::Hbase),
            "berkeleyje" | "berkeley" => Some(Self::Berkeley),
            "inmemory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// All shorthands selecting this family.
    pub fn shorthands(&self) -> &'static [&'static str] {
        match self {
            Self::Cassandra => &["cassandra", "cassandrathrift", "astyanax", "embeddedcassandra"],
            Self::Hbase => &["hbase"],
            Self::Berkeley => &["berkeleyje", "berkeley"],
            Self::Memory => &["inmemory"],
        }
    }

    /// The property key holding this family's scoping value, if it has one.
    pub fn scoping_key(&self) -> Option<&'static str> {
        match self {
            Self::Cassandra => Some(PROPERTY_CASSANDRA_KEYSPACE),
            Self::Hbase => Some(PROPERTY_HBASE_TABLE),
            Self::Berkeley => Some(PROPERTY_STORAGE_DIRECTORY),
            Self::Memory => None,
        }
    }

    /// Canonical family name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cassandra => "cassandra",
            Self::Hbase => "hbase",
            Self::Berkeley => "berkeley",
            Self::Memory => "inmemory",
        }
    }
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_resolution() {
        assert_eq!(
            BackendFamily::from_shorthand("cassandra"),
            Some(BackendFamily::Cassandra)
        );
        assert_eq!(
            BackendFamily::from_shorthand("embeddedcassandra"),
            Some(BackendFamily::Cassandra)
        );
        assert_eq!(BackendFamily::from_shorthand("hbase"), Some(BackendFamily::Hbase));
        assert_eq!(
            BackendFamily::from_shorthand("berkeleyje"),
            Some(BackendFamily::Berkeley)
        );
        assert_eq!(
            BackendFamily::from_shorthand("inmemory"),
            Some(BackendFamily::Memory)
        );
        assert_eq!(BackendFamily::from_shorthand("bogus"), None);
    }

    #[test]
    fn test_every_shorthand_round_trips() {
        for family in [
            BackendFamily::Cassandra,
            BackendFamily::Hbase,
            BackendFamily::Berkeley,
            BackendFamily::Memory,
        ] {
            for shorthand in family.shorthands() {
                assert_eq!(BackendFamily::from_shorthand(shorthand), Some(family));
            }
        }
    }

    #[test]
    fn test_scoping_keys() {
        assert_eq!(
            BackendFamily::Cassandra.scoping_key(),
            Some(PROPERTY_CASSANDRA_KEYSPACE)
        );
        assert_eq!(BackendFamily::Hbase.scoping_key(), Some(PROPERTY_HBASE_TABLE));
        assert_eq!(
            BackendFamily::Berkeley.scoping_key(),
            Some(PROPERTY_STORAGE_DIRECTORY)
        );
        assert_eq!(BackendFamily::Memory.scoping_key(), None);
    }
}
