//! Migration units and the context their hooks run against.
//!
//! A [`MigrationUnit`] is the code behind one version. Its hooks do not touch
//! the database; they append statements to a [`MigrationContext`] and the
//! engine runs them afterwards. Guards on the context turn a condition into a
//! [`HookInterrupt`] that the hook returns with `?`:
//!
//! ```ignore
//! fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
//!     ctx.abort_if(ctx.platform() != "duckdb", "DuckDB only")?;
//!     ctx.skip_if(ctx.schema().has_table("users"), "users already exists")?;
//!     ctx.add_sql("CREATE TABLE users (id INTEGER PRIMARY KEY)");
//!     Ok(())
//! }
//! ```

use crate::record::ExecutionState;
use crate::reporter::Reporter;
use std::sync::Arc;
use ym_core::{MigrationVersion, Schema, SqlValue, Statement};
use ym_db::Database;

/// Message used when a guard is given an empty message.
pub const UNKNOWN_REASON: &str = "Unknown Reason";

/// Message used by [`MigrationContext::irreversible`] without a message.
pub const IRREVERSIBLE_MESSAGE: &str = "This migration is irreversible and cannot be reverted.";

/// Why a hook stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookInterrupt {
    /// Leave this version alone and continue the run
    Skip(String),
    /// Stop the run
    Abort(String),
}

/// Outcome of a hook. `Ok(())` continues.
pub type HookResult = Result<(), HookInterrupt>;

/// Everything a unit may capture when it is built.
pub struct UnitInit {
    pub version: MigrationVersion,
    /// Platform name of the target database
    pub platform: String,
    pub database: Arc<dyn Database>,
    pub reporter: Arc<dyn Reporter>,
}

/// Code for one migration version.
///
/// `up` and `down` are required; the pre and post hooks default to doing
/// nothing.
pub trait MigrationUnit {
    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult;

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult;

    fn pre_up(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        Ok(())
    }

    fn post_up(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        Ok(())
    }

    fn pre_down(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        Ok(())
    }

    fn post_down(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        Ok(())
    }

    /// Human-readable name shown next to the version.
    fn name(&self) -> Option<String> {
        None
    }
}

/// Builds a fresh unit for each execution.
pub type MigrationFactory = Arc<dyn Fn(&UnitInit) -> Box<dyn MigrationUnit> + Send + Sync>;

/// Wrap a constructor closure as a [`MigrationFactory`].
pub fn factory<U, F>(build: F) -> MigrationFactory
where
    U: MigrationUnit + 'static,
    F: Fn(&UnitInit) -> U + Send + Sync + 'static,
{
    Arc::new(move |init: &UnitInit| -> Box<dyn MigrationUnit> { Box::new(build(init)) })
}

fn reason(message: &str) -> String {
    if message.is_empty() {
        UNKNOWN_REASON.to_string()
    } else {
        message.to_string()
    }
}

/// Handle passed to every hook.
pub struct MigrationContext<'a> {
    version: &'a MigrationVersion,
    platform: &'a str,
    schema: &'a Schema,
    reporter: &'a dyn Reporter,
    state: ExecutionState,
    statements: Vec<Statement>,
}

impl<'a> MigrationContext<'a> {
    pub(crate) fn new(
        version: &'a MigrationVersion,
        platform: &'a str,
        schema: &'a Schema,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            version,
            platform,
            schema,
            reporter,
            state: ExecutionState::PreProcessing,
            statements: Vec::new(),
        }
    }

    pub(crate) fn set_state(&mut self, state: ExecutionState) {
        self.state = state;
    }

    pub(crate) fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    /// Queue a statement.
    pub fn add_sql(&mut self, sql: impl Into<String>) {
        self.statements.push(Statement::new(sql));
    }

    /// Queue a statement with positional parameters.
    pub fn add_sql_with_params(&mut self, sql: impl Into<String>, params: Vec<SqlValue>) {
        self.statements.push(Statement::with_params(sql, params));
    }

    /// Statements queued so far.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// The live schema, read once before the first hook.
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Platform name of the target database.
    pub fn platform(&self) -> &str {
        self.platform
    }

    pub fn version(&self) -> &MigrationVersion {
        self.version
    }

    /// Abort the run when `condition` holds.
    pub fn abort_if(&self, condition: bool, message: &str) -> HookResult {
        if condition {
            Err(HookInterrupt::Abort(reason(message)))
        } else {
            Ok(())
        }
    }

    /// Skip this version when `condition` holds.
    pub fn skip_if(&self, condition: bool, message: &str) -> HookResult {
        if condition {
            Err(HookInterrupt::Skip(reason(message)))
        } else {
            Ok(())
        }
    }

    /// Report a warning when `condition` holds and carry on.
    pub fn warn_if(&self, condition: bool, message: &str) {
        if condition {
            let message = format!("Warning during {}: {}", self.state, reason(message));
            log::warn!("{} {message}", self.version);
            self.reporter.warn(&message);
        }
    }

    /// Always aborts; for migrations that cannot be reverted.
    pub fn irreversible(&self, message: &str) -> HookResult {
        let message = if message.is_empty() {
            IRREVERSIBLE_MESSAGE
        } else {
            message
        };
        Err(HookInterrupt::Abort(message.to_string()))
    }

    /// Write a progress line.
    pub fn write(&self, message: &str) {
        self.reporter.write(message);
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
