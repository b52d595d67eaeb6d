//! Snapshot of where a database stands relative to the registry.

use crate::error::MigrateResult;
use crate::store::MigrationStore;
use serde::Serialize;
use std::collections::BTreeSet;
use ym_core::MigrationVersion;

/// Label used when the store was not built from a config file.
pub const MANUALLY_CONFIGURED: &str = "manually configured";

/// Default display name of a set of migrations.
pub const DEFAULT_NAME: &str = "Yam Database Migrations";

/// One registered version and whether it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    pub version: MigrationVersion,
    pub formatted: String,
    pub migrated: bool,
}

/// Everything the `status` command shows.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub name: String,
    pub platform: String,
    pub configuration_source: String,
    pub tracking_table: String,
    pub namespace: Option<String>,
    pub migrations_directory: Option<String>,
    pub current_version: MigrationVersion,
    pub current_version_formatted: String,
    pub latest_version: MigrationVersion,
    pub latest_version_formatted: String,
    /// Ledger rows, registered or not
    pub executed_migrations: usize,
    pub executed_unavailable_migrations: Vec<MigrationVersion>,
    pub available_migrations: usize,
    /// Registered versions not yet applied
    pub new_migrations: usize,
    pub versions: Vec<VersionStatus>,
}

impl MigrationStatus {
    /// Read the ledger and describe the store.
    pub fn collect(store: &MigrationStore) -> MigrateResult<Self> {
        let migrated: BTreeSet<MigrationVersion> =
            store.migrated_versions()?.into_iter().collect();
        let available = store.available_versions();

        let versions: Vec<VersionStatus> = available
            .iter()
            .map(|v| VersionStatus {
                version: v.clone(),
                formatted: v.formatted(),
                migrated: migrated.contains(v),
            })
            .collect();
        let executed_unavailable: Vec<MigrationVersion> = migrated
            .iter()
            .filter(|v| !store.has_version(v))
            .cloned()
            .collect();
        let new_migrations = versions.iter().filter(|v| !v.migrated).count();

        let current = store.current_version()?;
        let latest = store.latest_version();

        Ok(Self {
            name: store.name().unwrap_or(DEFAULT_NAME).to_string(),
            platform: store.platform().to_string(),
            configuration_source: store
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| MANUALLY_CONFIGURED.to_string()),
            tracking_table: store.tracking_table().to_string(),
            namespace: store.namespace().map(str::to_string),
            migrations_directory: store
                .migrations_directory()
                .map(|p| p.display().to_string()),
            current_version_formatted: current.formatted(),
            current_version: current,
            latest_version_formatted: latest.formatted(),
            latest_version: latest,
            executed_migrations: migrated.len(),
            executed_unavailable_migrations: executed_unavailable,
            available_migrations: available.len(),
            new_migrations,
            versions,
        })
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
