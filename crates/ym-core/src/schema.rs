//! Normalized schema object model.
//!
//! A [`Schema`] is what database introspection produces and what the diff
//! capability consumes. Tables and sequences keep whatever order their
//! producer gave them; see [`crate::snapshot`] for the order-independent
//! declarative form.
//!
//! Column and foreign-key attributes beyond the name and type live in open
//! option dictionaries so that conversion to and from snapshots is lossless.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form attribute dictionary, preserved verbatim.
pub type Options = BTreeMap<String, serde_yaml::Value>;

/// Column option key: `NOT NULL` flag.
pub const OPT_NOT_NULL: &str = "notnull";
/// Column option key: default expression.
pub const OPT_DEFAULT: &str = "default";
/// Column option key: character length.
pub const OPT_LENGTH: &str = "length";
/// Column option key: numeric precision.
pub const OPT_PRECISION: &str = "precision";
/// Column option key: numeric scale.
pub const OPT_SCALE: &str = "scale";

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: String,
    pub options: Options,
}

impl Column {
    /// A column with no options.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            options: Options::new(),
        }
    }

    /// Builder-style option setter.
    pub fn with_option(mut self, key: &str, value: impl Into<serde_yaml::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Whether the column is declared `NOT NULL`.
    pub fn not_null(&self) -> bool {
        self.options
            .get(OPT_NOT_NULL)
            .and_then(serde_yaml::Value::as_bool)
            .unwrap_or(false)
    }

    /// The default expression, if any.
    pub fn default_expr(&self) -> Option<String> {
        match self.options.get(OPT_DEFAULT)? {
            serde_yaml::Value::Null => None,
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// An index (including primary keys and unique constraints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
    pub flags: Vec<String>,
}

impl Index {
    /// Whether this index is backed by a table constraint rather than a
    /// standalone `CREATE INDEX`.
    pub fn is_constraint(&self) -> bool {
        self.primary || self.flags.iter().any(|f| f == Index::CONSTRAINT_FLAG)
    }

    /// Flag marking a unique index that is declared as a table constraint.
    pub const CONSTRAINT_FLAG: &'static str = "constraint";
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    pub options: Options,
}

/// A sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub allocation_size: i64,
    pub initial_value: i64,
}

/// A table with its columns, indexes and foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// An empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Look up a foreign key by name.
    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|f| f.name == name)
    }

    /// The primary key index, if declared.
    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.primary)
    }
}

/// A full database schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub sequences: Vec<Sequence>,
}

impl Schema {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns `true` if the schema contains a table named `name`.
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Look up a sequence by name.
    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.name == name)
    }

    /// Table names in schema order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// A copy of this schema without the named table.
    pub fn without_table(&self, name: &str) -> Schema {
        Schema {
            tables: self
                .tables
                .iter()
                .filter(|t| t.name != name)
                .cloned()
                .collect(),
            sequences: self.sequences.clone(),
        }
    }
}
