//! One registered migration version and its execution protocol.

use crate::error::{MigrateError, MigrateResult};
use crate::reporter::Reporter;
use crate::unit::{
    HookInterrupt, HookResult, MigrationContext, MigrationFactory, MigrationUnit, UnitInit,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use ym_core::{Direction, MigrationVersion, SqlValue, Statement};
use ym_db::{with_transaction, Database};

/// Where a version is in its execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    NotExecuted,
    PreProcessing,
    Executing,
    PostProcessing,
    Executed,
    Error,
    Skipped,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExecutionState::NotExecuted => "Not Executed",
            ExecutionState::PreProcessing => "Pre-Processing",
            ExecutionState::Executing => "Executing",
            ExecutionState::PostProcessing => "Post-Processing",
            ExecutionState::Executed => "Executed",
            ExecutionState::Error => "Error",
            ExecutionState::Skipped => "Skipped",
        };
        f.write_str(label)
    }
}

/// Collaborators a version needs while it runs.
pub(crate) struct ExecutionEnv<'a> {
    pub database: &'a Arc<dyn Database>,
    pub reporter: &'a Arc<dyn Reporter>,
    pub tracking_table: &'a str,
}

/// A registered version: its id, how to build its unit, and the outcome of
/// its most recent execution.
pub struct VersionRecord {
    version: MigrationVersion,
    factory: MigrationFactory,
    name: Option<String>,
    state: ExecutionState,
    statements: Vec<Statement>,
    elapsed: Duration,
}

impl fmt::Debug for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionRecord")
            .field("version", &self.version)
            .field("state", &self.state)
            .field("statements", &self.statements.len())
            .finish()
    }
}

impl VersionRecord {
    pub fn new(version: MigrationVersion, factory: MigrationFactory) -> Self {
        Self {
            version,
            factory,
            name: None,
            state: ExecutionState::NotExecuted,
            statements: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn version(&self) -> &MigrationVersion {
        &self.version
    }

    /// The unit's name, known once it has been executed.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.state
    }

    /// Statements captured by the most recent execution.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Wall-clock time of the most recent execution.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Run this version in `direction`.
    ///
    /// The unit's hooks only queue statements. In a live run those are then
    /// executed inside one transaction together with the ledger update; in a
    /// dry run nothing is sent to the database and no transaction is opened.
    pub(crate) fn execute(
        &mut self,
        env: &ExecutionEnv<'_>,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<Vec<Statement>> {
        let started = Instant::now();
        self.statements.clear();
        self.state = ExecutionState::PreProcessing;

        let result = self.run(env, direction, dry_run);
        self.elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.state = ExecutionState::Executed;
                let verb = if direction.is_up() {
                    "++ migrated"
                } else {
                    "-- reverted"
                };
                env.reporter.write(&format!(
                    "\n  {verb} ({:.2}s)",
                    self.elapsed.as_secs_f64()
                ));
                Ok(self.statements.clone())
            }
            Err(err) => {
                self.state = match err {
                    MigrateError::Skipped { .. } => ExecutionState::Skipped,
                    _ => ExecutionState::Error,
                };
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        env: &ExecutionEnv<'_>,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<()> {
        let version = self.version.clone();
        let platform = env.database.db_type();
        let mut unit = (self.factory)(&UnitInit {
            version: version.clone(),
            platform: platform.to_string(),
            database: Arc::clone(env.database),
            reporter: Arc::clone(env.reporter),
        });
        self.name = unit.name();

        env.reporter.write(&match (direction, &self.name) {
            (Direction::Up, Some(name)) => format!("\n  ++ migrating {version} ({name})\n"),
            (Direction::Up, None) => format!("\n  ++ migrating {version}\n"),
            (Direction::Down, Some(name)) => format!("\n  -- reverting {version} ({name})\n"),
            (Direction::Down, None) => format!("\n  -- reverting {version}\n"),
        });

        let schema = env.database.introspect_schema()?;
        let reporter: &dyn Reporter = &**env.reporter;
        let mut ctx = MigrationContext::new(&version, platform, &schema, reporter);

        let pre = match direction {
            Direction::Up => unit.pre_up(&mut ctx),
            Direction::Down => unit.pre_down(&mut ctx),
        };
        let main = pre.and_then(|()| {
            self.state = ExecutionState::Executing;
            ctx.set_state(ExecutionState::Executing);
            match direction {
                Direction::Up => unit.up(&mut ctx),
                Direction::Down => unit.down(&mut ctx),
            }
        });
        if let Err(interrupt) = main {
            self.statements = ctx.into_statements();
            return Err(interrupted(&version, reporter, interrupt));
        }

        let result = if dry_run {
            for stmt in ctx.statements() {
                reporter.write(&format!("     -> {}", stmt.sql));
            }
            let queued = ctx.statements().len();
            self.state = ExecutionState::PostProcessing;
            ctx.set_state(ExecutionState::PostProcessing);
            post_hook(&mut *unit, direction, &mut ctx)
                .map_err(|interrupt| interrupted(&version, reporter, interrupt))
                .map(|()| {
                    for stmt in &ctx.statements()[queued..] {
                        reporter.write(&format!("     -> {}", stmt.sql));
                    }
                })
        } else {
            let state = &mut self.state;
            with_transaction(&**env.database, |db| {
                run_statements(db, &version, reporter, ctx.statements())?;
                let executed = ctx.statements().len();

                *state = ExecutionState::PostProcessing;
                ctx.set_state(ExecutionState::PostProcessing);
                post_hook(&mut *unit, direction, &mut ctx)
                    .map_err(|interrupt| interrupted(&version, reporter, interrupt))?;
                run_statements(db, &version, reporter, &ctx.statements()[executed..])?;

                record_in_ledger(db, env.tracking_table, &version, direction)?;
                Ok(())
            })
        };

        self.statements = ctx.into_statements();
        result
    }

    /// Whether the ledger holds this version.
    pub(crate) fn is_migrated(&self, db: &dyn Database, tracking_table: &str) -> MigrateResult<bool> {
        ledger_contains(db, tracking_table, &self.version)
    }

    /// Insert this version into the ledger without running it.
    pub(crate) fn mark_migrated(&self, db: &dyn Database, tracking_table: &str) -> MigrateResult<()> {
        record_in_ledger(db, tracking_table, &self.version, Direction::Up)
    }

    /// Remove this version from the ledger without running it.
    pub(crate) fn mark_not_migrated(
        &self,
        db: &dyn Database,
        tracking_table: &str,
    ) -> MigrateResult<()> {
        record_in_ledger(db, tracking_table, &self.version, Direction::Down)
    }
}

fn post_hook(
    unit: &mut dyn MigrationUnit,
    direction: Direction,
    ctx: &mut MigrationContext<'_>,
) -> HookResult {
    match direction {
        Direction::Up => unit.post_up(ctx),
        Direction::Down => unit.post_down(ctx),
    }
}

fn interrupted(
    version: &MigrationVersion,
    reporter: &dyn Reporter,
    interrupt: HookInterrupt,
) -> MigrateError {
    match interrupt {
        HookInterrupt::Skip(message) => {
            log::warn!("Migration {version} skipped: {message}");
            reporter.write(&format!("\n  SS skipped (Reason: {message})"));
            MigrateError::Skipped {
                version: version.to_string(),
                message,
            }
        }
        HookInterrupt::Abort(message) => {
            reporter.write(&format!("\n  Migration {version} failed. Reason: {message}"));
            MigrateError::Abort {
                version: version.to_string(),
                message,
            }
        }
    }
}

fn run_statements(
    db: &dyn Database,
    version: &MigrationVersion,
    reporter: &dyn Reporter,
    statements: &[Statement],
) -> MigrateResult<()> {
    for stmt in statements {
        reporter.write(&format!("     -> {}", stmt.sql));
        let outcome = if stmt.has_params() {
            db.execute_with_params(&stmt.sql, &stmt.params)
        } else {
            db.execute(&stmt.sql)
        };
        outcome.map_err(|source| MigrateError::DatabaseExecution {
            version: version.to_string(),
            statement: stmt.sql.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Whether the ledger table has a row for `version`.
pub(crate) fn ledger_contains(
    db: &dyn Database,
    tracking_table: &str,
    version: &MigrationVersion,
) -> MigrateResult<bool> {
    let rows = db.query_column(
        &format!("SELECT version FROM {tracking_table} WHERE version = ?"),
        &[SqlValue::from(version.as_str())],
    )?;
    Ok(!rows.is_empty())
}

/// Insert (up) or delete (down) the ledger row for `version`.
pub(crate) fn record_in_ledger(
    db: &dyn Database,
    tracking_table: &str,
    version: &MigrationVersion,
    direction: Direction,
) -> MigrateResult<()> {
    let sql = match direction {
        Direction::Up => format!("INSERT INTO {tracking_table} (version) VALUES (?)"),
        Direction::Down => format!("DELETE FROM {tracking_table} WHERE version = ?"),
    };
    db.execute_with_params(&sql, &[SqlValue::from(version.as_str())])?;
    Ok(())
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
