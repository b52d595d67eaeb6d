//! Directional runs across the registry.
//!
//! [`MigrationRunner::migrate`] works out which way to go from the current
//! ledger version, collects the eligible versions and runs each through the
//! per-version protocol. Every version commits on its own; a failure leaves
//! earlier versions applied.

use crate::error::{MigrateError, MigrateResult};
use crate::store::MigrationStore;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ym_core::{Direction, MigrationVersion, SqlValue, Statement};

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationSummary {
    pub direction: Direction,
    pub from: MigrationVersion,
    pub to: MigrationVersion,
    pub dry_run: bool,
    /// Executed versions with their statements, in execution order
    pub executed: Vec<(MigrationVersion, Vec<Statement>)>,
    /// Versions a guard skipped; they stay out of the ledger
    pub skipped: Vec<MigrationVersion>,
    pub elapsed: Duration,
}

impl MigrationSummary {
    fn new(direction: Direction, from: MigrationVersion, to: MigrationVersion, dry_run: bool) -> Self {
        Self {
            direction,
            from,
            to,
            dry_run,
            executed: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `true` if nothing ran and nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.executed.is_empty() && self.skipped.is_empty()
    }

    pub fn versions_executed(&self) -> usize {
        self.executed.len()
    }

    pub fn statement_count(&self) -> usize {
        self.executed.iter().map(|(_, stmts)| stmts.len()).sum()
    }

    /// Statements captured for `version`, if it was executed.
    pub fn statements_for(&self, version: &MigrationVersion) -> Option<&[Statement]> {
        self.executed
            .iter()
            .find(|(v, _)| v == version)
            .map(|(_, stmts)| stmts.as_slice())
    }
}

/// Drives runs against a [`MigrationStore`].
pub struct MigrationRunner<'a> {
    store: &'a mut MigrationStore,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(store: &'a mut MigrationStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MigrationStore {
        self.store
    }

    /// Versions that would run to reach `target` in `direction`.
    pub fn migrations_to_execute(
        &self,
        direction: Direction,
        target: &MigrationVersion,
    ) -> MigrateResult<Vec<MigrationVersion>> {
        self.store.migrations_to_execute(direction, target)
    }

    /// Move the database to `target`, or to the latest registered version.
    ///
    /// Already being at the target with nothing left to run is an empty
    /// summary, not an error.
    pub fn migrate(
        &mut self,
        target: Option<&MigrationVersion>,
        dry_run: bool,
    ) -> MigrateResult<MigrationSummary> {
        let to = target
            .cloned()
            .unwrap_or_else(|| self.store.latest_version());
        let from = self.store.current_version()?;

        if !to.is_zero() && !self.store.has_version(&to) {
            return Err(MigrateError::UnknownVersion {
                version: to.into_inner(),
            });
        }

        let direction = if from > to {
            Direction::Down
        } else {
            Direction::Up
        };
        let to_execute = self.store.migrations_to_execute(direction, &to)?;
        let mut summary = MigrationSummary::new(direction, from.clone(), to.clone(), dry_run);

        if from == to && to_execute.is_empty() && self.store.number_of_available_migrations() > 0 {
            return Ok(summary);
        }

        let reporter = self.store.reporter().clone();
        if dry_run {
            reporter.write(&format!(
                "Executing dry run of migration {direction} to {to} from {from}"
            ));
        } else {
            reporter.write(&format!("Migrating {direction} to {to} from {from}"));
        }

        if to_execute.is_empty() {
            return Err(MigrateError::NoMigrationsToExecute);
        }

        for version in &to_execute {
            match self.store.execute_version(version, direction, dry_run) {
                Ok(statements) => summary.executed.push((version.clone(), statements)),
                Err(MigrateError::Skipped { .. }) => summary.skipped.push(version.clone()),
                Err(err) => {
                    let done = summary.versions_executed();
                    let verb = if dry_run { "ran" } else { "committed" };
                    log::error!("Migration {version} failed after {done} version(s) {verb}");
                    reporter.write(&format!(
                        "\n  Migration {version} failed; {done} version(s) {verb} before it"
                    ));
                    return Err(err);
                }
            }
            summary.elapsed += self.store.version(version)?.elapsed();
        }

        reporter.write("\n  ------------------------\n");
        reporter.write(&format!(
            "  ++ finished in {:.2}s",
            summary.elapsed.as_secs_f64()
        ));
        reporter.write(&format!(
            "  ++ {} migrations executed",
            summary.versions_executed()
        ));
        if !summary.skipped.is_empty() {
            reporter.write(&format!("  ++ {} migrations skipped", summary.skipped.len()));
        }
        reporter.write(&format!("  ++ {} sql queries", summary.statement_count()));

        Ok(summary)
    }

    /// Statements a migration to `target` would run, without running them.
    pub fn get_sql(&mut self, target: Option<&MigrationVersion>) -> MigrateResult<MigrationSummary> {
        self.migrate(target, true)
    }

    /// Write the statements of a dry run to `path`.
    ///
    /// A directory gets a `yam_migration_<timestamp>.sql` file inside it.
    pub fn write_sql_file(
        &mut self,
        path: &Path,
        target: Option<&MigrationVersion>,
    ) -> MigrateResult<PathBuf> {
        let summary = self.get_sql(target)?;
        let now = Local::now();

        let mut out = format!(
            "-- Yam Migration File Generated on {}\n-- Migrating from {} to {}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            summary.from,
            summary.to
        );
        for (version, statements) in &summary.executed {
            out.push_str(&format!("\n-- Version {version}\n"));
            push_statements(&mut out, statements);
        }

        let path = if path.is_dir() {
            path.join(format!("yam_migration_{}.sql", now.format("%Y%m%d%H%M%S")))
        } else {
            path.to_path_buf()
        };
        self.write_file(&path, &out)?;
        Ok(path)
    }

    /// Run one version regardless of the current ledger version.
    ///
    /// A skipped version yields no statements.
    pub fn execute(
        &mut self,
        version: &MigrationVersion,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<Vec<Statement>> {
        self.store.version(version)?;
        let reporter = self.store.reporter().clone();
        if dry_run {
            reporter.write(&format!(
                "Executing dry run of migration {direction} for version {version}"
            ));
        }
        match self.store.execute_version(version, direction, dry_run) {
            Err(MigrateError::Skipped { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Write the statements of one version, run dry in `direction`, to `path`.
    ///
    /// A directory gets a `yam_migration_<timestamp>.sql` file inside it.
    pub fn write_version_sql_file(
        &mut self,
        path: &Path,
        version: &MigrationVersion,
        direction: Direction,
    ) -> MigrateResult<PathBuf> {
        let statements = self.execute(version, direction, true)?;
        let now = Local::now();

        let mut out = format!(
            "-- Yam Migration File Generated on {}\n\n-- Version {version} ({direction})\n",
            now.format("%Y-%m-%d %H:%M:%S")
        );
        push_statements(&mut out, &statements);

        let path = if path.is_dir() {
            path.join(format!("yam_migration_{}.sql", now.format("%Y%m%d%H%M%S")))
        } else {
            path.to_path_buf()
        };
        self.write_file(&path, &out)?;
        Ok(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> MigrateResult<()> {
        self.store
            .reporter()
            .write(&format!("\nWriting migration file to \"{}\"", path.display()));
        std::fs::write(path, contents).map_err(|e| MigrateError::io(path, e))
    }
}

fn push_statements(out: &mut String, statements: &[Statement]) {
    for stmt in statements {
        if stmt.has_params() {
            let params: Vec<String> = stmt.params.iter().map(render_param).collect();
            out.push_str(&format!("-- params: {}\n", params.join(", ")));
        }
        out.push_str(&stmt.sql);
        out.push_str(";\n");
    }
}

fn render_param(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
