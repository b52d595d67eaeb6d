//! Declarative schema snapshots.
//!
//! A snapshot is the YAML form of a schema, keyed by name so that it is
//! independent of the order the database reports objects in:
//!
//! ```yaml
//! tables:
//!   users:
//!     columns:
//!       - { name: id, type: INTEGER, notnull: true }
//!     indexes:
//!       primary: { columns: [id], unique: true, primary: true, flags: [] }
//!     foreignKeys: {}
//! sequences:
//!   users_id_seq: { allocation_size: 1, initial_size: 1 }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::schema::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Full declarative schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, TableSnapshot>,

    #[serde(default)]
    pub sequences: BTreeMap<String, SequenceSnapshot>,
}

/// One table: ordered columns plus name-keyed indexes and foreign keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSnapshot {
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,

    #[serde(default)]
    pub indexes: BTreeMap<String, IndexSnapshot>,

    #[serde(default, rename = "foreignKeys")]
    pub foreign_keys: BTreeMap<String, ForeignKeySnapshot>,
}

/// A column; every attribute other than name and type is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: String,

    #[serde(flatten)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSnapshot {
    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub primary: bool,

    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeySnapshot {
    pub columns: Vec<String>,

    #[serde(rename = "foreignTable")]
    pub foreign_table: String,

    #[serde(rename = "foreignColumns")]
    pub foreign_columns: Vec<String>,

    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceSnapshot {
    pub allocation_size: i64,
    pub initial_size: i64,
}

impl SchemaSnapshot {
    /// Parse a snapshot from YAML text.
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Render the snapshot as YAML text.
    pub fn to_yaml_string(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Write the snapshot to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let yaml = self.to_yaml_string()?;
        std::fs::write(path, yaml).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Returns `true` if the snapshot has no tables and no sequences.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.sequences.is_empty()
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
