//! Helpers shared across commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use ym_core::{Config, MigrationVersion};

/// Snapshot file used when `--schema` is not given.
pub(crate) const DEFAULT_SCHEMA_FILE: &str = "schema.yml";

/// Parse a version argument.
pub(crate) fn parse_version(raw: &str) -> Result<MigrationVersion> {
    MigrationVersion::new(raw.trim())
        .with_context(|| format!("Invalid migration version \"{raw}\""))
}

/// The snapshot file to read or write.
pub(crate) fn schema_file(config: &Config, explicit: Option<&PathBuf>) -> PathBuf {
    match explicit {
        Some(path) => path.clone(),
        None => config.schema_directory_path().join(DEFAULT_SCHEMA_FILE),
    }
}

/// `    >> 2023-01-01 00:00:00 (20230101000000)`
pub(crate) fn version_line(version: &MigrationVersion) -> String {
    format!("    >> {} ({})", version.formatted(), version)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
