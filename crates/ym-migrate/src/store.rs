//! Registry of migration versions and the ledger of applied ones.
//!
//! The registry is what the code knows about; the ledger table is what the
//! database says has been applied. The two are allowed to disagree: ledger
//! rows with no registered version are reported, never removed.

use crate::error::{ConfigurationError, MigrateError, MigrateResult};
use crate::record::{ledger_contains, ExecutionEnv, VersionRecord};
use crate::reporter::Reporter;
use crate::sql_file::SqlFileMigration;
use crate::unit::MigrationFactory;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ym_core::config::DEFAULT_TABLE_NAME;
use ym_core::{Config, Direction, MigrationVersion, Statement};
use ym_db::Database;

/// Registered versions plus access to the ledger table.
pub struct MigrationStore {
    name: Option<String>,
    database: Arc<dyn Database>,
    reporter: Arc<dyn Reporter>,
    tracking_table: String,
    namespace: Option<String>,
    migrations_directory: Option<PathBuf>,
    schema_directory: Option<PathBuf>,
    source: Option<PathBuf>,
    records: BTreeMap<MigrationVersion, VersionRecord>,
    tracking_table_created: Cell<bool>,
}

impl MigrationStore {
    /// An empty store using the default ledger table.
    pub fn new(database: Arc<dyn Database>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            name: None,
            database,
            reporter,
            tracking_table: DEFAULT_TABLE_NAME.to_string(),
            namespace: None,
            migrations_directory: None,
            schema_directory: None,
            source: None,
            records: BTreeMap::new(),
            tracking_table_created: Cell::new(false),
        }
    }

    /// Build a store from `migrations.yml` and register every migration file
    /// it points at.
    pub fn from_config(
        config: &Config,
        database: Arc<dyn Database>,
        reporter: Arc<dyn Reporter>,
    ) -> MigrateResult<Self> {
        let mut store = Self::new(database, reporter)
            .with_tracking_table(&config.table_name)
            .with_schema_directory(config.schema_directory_path());
        store.name = config.name.clone();
        store.namespace = config.migrations_namespace.clone();
        store.migrations_directory = config.migrations_directory_path();
        store.source = config.source.clone();

        if let Some(dir) = store.migrations_directory.clone() {
            if dir.is_dir() {
                store.register_from_directory(&dir)?;
            } else {
                log::debug!("Migrations directory {} does not exist yet", dir.display());
            }
        }
        for (version, path) in config.migration_entries() {
            let migration = SqlFileMigration::load(&path)?;
            store.register(version, migration.into_factory())?;
        }
        Ok(store)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tracking_table(mut self, table: impl Into<String>) -> Self {
        self.tracking_table = table.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_migrations_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_directory = Some(dir.into());
        self
    }

    pub fn with_schema_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_directory = Some(dir.into());
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.database
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn tracking_table(&self) -> &str {
        &self.tracking_table
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn migrations_directory(&self) -> Option<&Path> {
        self.migrations_directory.as_deref()
    }

    /// Directory snapshot files are read from and written to.
    pub fn schema_directory(&self) -> Option<&Path> {
        self.schema_directory.as_deref()
    }

    /// Config file the store was built from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Platform name of the target database.
    pub fn platform(&self) -> &'static str {
        self.database.db_type()
    }

    /// Registered versions, ascending.
    pub fn records(&self) -> impl Iterator<Item = &VersionRecord> {
        self.records.values()
    }

    /// Both the namespace and the migrations directory must be set.
    pub fn validate(&self) -> MigrateResult<()> {
        if self.namespace.is_none() {
            return Err(ConfigurationError::MissingNamespace.into());
        }
        if self.migrations_directory.is_none() {
            return Err(ConfigurationError::MissingDirectory.into());
        }
        Ok(())
    }

    /// Format a version as `YYYY-MM-DD HH:MM:SS`.
    pub fn format_version(&self, version: &MigrationVersion) -> String {
        version.formatted()
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Register one version.
    pub fn register(
        &mut self,
        version: MigrationVersion,
        factory: MigrationFactory,
    ) -> MigrateResult<()> {
        if self.records.contains_key(&version) {
            return Err(ConfigurationError::DuplicateVersion {
                version: version.into_inner(),
            }
            .into());
        }
        log::debug!("Registered migration {version}");
        self.records
            .insert(version.clone(), VersionRecord::new(version, factory));
        Ok(())
    }

    /// Register several versions, stopping at the first duplicate.
    pub fn register_many<I>(&mut self, migrations: I) -> MigrateResult<()>
    where
        I: IntoIterator<Item = (MigrationVersion, MigrationFactory)>,
    {
        for (version, factory) in migrations {
            self.register(version, factory)?;
        }
        Ok(())
    }

    /// Register every `Version<YYYYMMDDHHMMSS>.sql` file in `dir`.
    ///
    /// Returns the registered versions, ascending.
    pub fn register_from_directory(&mut self, dir: &Path) -> MigrateResult<Vec<MigrationVersion>> {
        let mut registered = Vec::new();
        for (version, path) in SqlFileMigration::discover(dir)? {
            let migration = SqlFileMigration::load(&path)?;
            self.register(version.clone(), migration.into_factory())?;
            registered.push(version);
        }
        Ok(registered)
    }

    // ── Registry queries ───────────────────────────────────────────────

    pub fn has_version(&self, version: &MigrationVersion) -> bool {
        self.records.contains_key(version)
    }

    /// Look up a registered version.
    pub fn version(&self, version: &MigrationVersion) -> MigrateResult<&VersionRecord> {
        self.records
            .get(version)
            .ok_or_else(|| MigrateError::UnknownVersion {
                version: version.to_string(),
            })
    }

    /// Registered versions, ascending.
    pub fn available_versions(&self) -> Vec<MigrationVersion> {
        self.records.keys().cloned().collect()
    }

    pub fn number_of_available_migrations(&self) -> usize {
        self.records.len()
    }

    /// Highest registered version, or `"0"`.
    pub fn latest_version(&self) -> MigrationVersion {
        self.records
            .keys()
            .next_back()
            .cloned()
            .unwrap_or_else(MigrationVersion::zero)
    }

    // ── Ledger ─────────────────────────────────────────────────────────

    /// Create the ledger table if it does not exist yet.
    pub fn ensure_tracking_table(&self) -> MigrateResult<()> {
        if self.tracking_table_created.get() {
            return Ok(());
        }
        if !self.database.relation_exists(&self.tracking_table)? {
            log::debug!("Creating ledger table {}", self.tracking_table);
            self.database.execute(&format!(
                "CREATE TABLE {} (version VARCHAR(255) PRIMARY KEY)",
                self.tracking_table
            ))?;
        }
        self.tracking_table_created.set(true);
        Ok(())
    }

    fn tracking_table_exists(&self) -> MigrateResult<bool> {
        if self.tracking_table_created.get() {
            return Ok(true);
        }
        Ok(self.database.relation_exists(&self.tracking_table)?)
    }

    /// Every version in the ledger, ascending. A missing ledger table reads
    /// as empty.
    pub fn migrated_versions(&self) -> MigrateResult<Vec<MigrationVersion>> {
        if !self.tracking_table_exists()? {
            return Ok(Vec::new());
        }
        let rows = self.database.query_column(
            &format!(
                "SELECT version FROM {} ORDER BY version",
                self.tracking_table
            ),
            &[],
        )?;
        let mut versions: Vec<MigrationVersion> = rows
            .into_iter()
            .filter_map(|raw| match MigrationVersion::new(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("Ignoring ledger row: {e}");
                    None
                }
            })
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn migrated_set(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        Ok(self.migrated_versions()?.into_iter().collect())
    }

    /// Whether `version` is in the ledger.
    pub fn has_version_migrated(&self, version: &MigrationVersion) -> MigrateResult<bool> {
        if !self.tracking_table_exists()? {
            return Ok(false);
        }
        match self.records.get(version) {
            Some(record) => record.is_migrated(&*self.database, &self.tracking_table),
            None => ledger_contains(&*self.database, &self.tracking_table, version),
        }
    }

    /// Number of ledger rows, registered or not.
    pub fn number_of_executed_migrations(&self) -> MigrateResult<usize> {
        Ok(self.migrated_versions()?.len())
    }

    /// Highest version that is both registered and applied, or `"0"`.
    pub fn current_version(&self) -> MigrateResult<MigrationVersion> {
        Ok(self
            .migrated_versions()?
            .into_iter()
            .filter(|v| self.records.contains_key(v))
            .max()
            .unwrap_or_else(MigrationVersion::zero))
    }

    /// Applied versions that are not registered, ascending.
    pub fn unavailable_migrated_versions(&self) -> MigrateResult<Vec<MigrationVersion>> {
        Ok(self
            .migrated_versions()?
            .into_iter()
            .filter(|v| !self.records.contains_key(v))
            .collect())
    }

    /// Versions that must run to reach `target` in `direction`, in execution
    /// order.
    ///
    /// Up walks the registry ascending and keeps unapplied versions at or
    /// below `target`; down walks it descending and keeps applied versions
    /// above `target`.
    pub fn migrations_to_execute(
        &self,
        direction: Direction,
        target: &MigrationVersion,
    ) -> MigrateResult<Vec<MigrationVersion>> {
        if !target.is_zero() && !self.has_version(target) {
            return Err(MigrateError::UnknownVersion {
                version: target.to_string(),
            });
        }
        let migrated = self.migrated_set()?;

        let pending = match direction {
            Direction::Up => self
                .records
                .keys()
                .filter(|v| *v <= target && !migrated.contains(*v))
                .cloned()
                .collect(),
            Direction::Down => self
                .records
                .keys()
                .rev()
                .filter(|v| *v > target && migrated.contains(*v))
                .cloned()
                .collect(),
        };
        Ok(pending)
    }

    /// Alias of [`MigrationStore::migrations_to_execute`].
    pub fn pending_set(
        &self,
        direction: Direction,
        target: &MigrationVersion,
    ) -> MigrateResult<Vec<MigrationVersion>> {
        self.migrations_to_execute(direction, target)
    }

    /// Add a registered version to the ledger without running it.
    pub fn mark_migrated(&self, version: &MigrationVersion) -> MigrateResult<()> {
        self.ensure_tracking_table()?;
        self.version(version)?
            .mark_migrated(&*self.database, &self.tracking_table)
    }

    /// Remove a registered version from the ledger without running it.
    pub fn mark_not_migrated(&self, version: &MigrationVersion) -> MigrateResult<()> {
        self.ensure_tracking_table()?;
        self.version(version)?
            .mark_not_migrated(&*self.database, &self.tracking_table)
    }

    /// Run one registered version through the execution protocol.
    pub(crate) fn execute_version(
        &mut self,
        version: &MigrationVersion,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<Vec<Statement>> {
        if !dry_run {
            self.ensure_tracking_table()?;
        }
        let env = ExecutionEnv {
            database: &self.database,
            reporter: &self.reporter,
            tracking_table: &self.tracking_table,
        };
        let record = self
            .records
            .get_mut(version)
            .ok_or_else(|| MigrateError::UnknownVersion {
                version: version.to_string(),
            })?;
        record.execute(&env, direction, dry_run)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
