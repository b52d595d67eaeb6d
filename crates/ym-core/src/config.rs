//! Configuration types and parsing for migrations.yml

use crate::error::{CoreError, CoreResult};
use crate::version::MigrationVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in a project directory.
pub const DEFAULT_CONFIG_FILE: &str = "migrations.yml";

/// Default name of the ledger table.
pub const DEFAULT_TABLE_NAME: &str = "yam_migration_versions";

const DEFAULT_DB_PATH: &str = ":memory:";

/// Migration configuration from migrations.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Display name of this set of migrations
    #[serde(default)]
    pub name: Option<String>,

    /// Ledger table tracking applied versions
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Module path that generated Rust migrations live in
    #[serde(default)]
    pub migrations_namespace: Option<String>,

    /// Directory holding `Version<YYYYMMDDHHMMSS>` migration files
    #[serde(default)]
    pub migrations_directory: Option<String>,

    /// Directory holding schema snapshot files
    #[serde(default)]
    pub schema_directory: Option<String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration files registered explicitly, in addition to the directory
    #[serde(default)]
    pub migrations: Vec<MigrationEntry>,

    /// File this configuration was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// An explicitly registered migration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationEntry {
    /// Version the file is registered under
    pub version: MigrationVersion,

    /// Path to the SQL migration file
    pub path: String,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            table_name: default_table_name(),
            migrations_namespace: None,
            migrations_directory: None,
            schema_directory: None,
            database: DatabaseConfig::default(),
            migrations: Vec::new(),
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.source = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for migrations.yml or migrations.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join(DEFAULT_CONFIG_FILE);
        let yaml_path = dir.join("migrations.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.table_name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "table_name cannot be empty".to_string(),
            });
        }

        // The ledger table name is interpolated into SQL
        if !self
            .table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "table_name '{}' must contain only alphanumeric characters, '_' or '.'",
                    self.table_name
                ),
            });
        }

        Ok(())
    }

    /// Directory relative paths resolve against: the config file's parent, or
    /// the current directory for manually built configs.
    pub fn base_dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir().join(p)
        }
    }

    /// Absolute migrations directory, if configured
    pub fn migrations_directory_path(&self) -> Option<PathBuf> {
        self.migrations_directory.as_deref().map(|d| self.resolve(d))
    }

    /// Absolute schema directory, falling back to the base directory
    pub fn schema_directory_path(&self) -> PathBuf {
        match self.schema_directory.as_deref() {
            Some(d) => self.resolve(d),
            None => self.base_dir(),
        }
    }

    /// Database path with relative file paths resolved
    pub fn database_path(&self) -> String {
        if self.database.path == DEFAULT_DB_PATH {
            self.database.path.clone()
        } else {
            self.resolve(&self.database.path).display().to_string()
        }
    }

    /// Explicit migration entries with resolved paths
    pub fn migration_entries(&self) -> Vec<(MigrationVersion, PathBuf)> {
        self.migrations
            .iter()
            .map(|m| (m.version.clone(), self.resolve(&m.path)))
            .collect()
    }

    /// Display name, falling back to a generic title
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Yam Database Migrations")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
