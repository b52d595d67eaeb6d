//! Database trait definitions

use crate::error::{DbError, DbResult};
use ym_core::{Schema, SqlValue};

/// Database abstraction trait for Yam
///
/// All calls are synchronous and run against one shared connection.
/// Implementations must be Send + Sync so a handle can be shared with
/// migration units through an `Arc`.
pub trait Database: Send + Sync {
    /// Execute a single SQL statement, returns affected rows
    fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute a single SQL statement with positional parameters
    fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Run a query and return every row with values coerced to strings
    /// (`None` for SQL NULL)
    fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Check if a table or view exists
    fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Open a transaction
    fn begin_transaction(&self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()>;

    /// Introspect the live schema
    fn introspect_schema(&self) -> DbResult<Schema>;

    /// Database type identifier, compared by generated migrations
    fn db_type(&self) -> &'static str;

    /// Return the first column of every row, skipping NULLs
    fn query_column(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<String>> {
        Ok(self
            .query_rows(sql, params)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
pub fn with_transaction<T, E, F>(db: &dyn Database, body: F) -> Result<T, E>
where
    F: FnOnce(&dyn Database) -> Result<T, E>,
    E: From<DbError>,
{
    db.begin_transaction()?;

    let result = body(db);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = db.commit() {
                let _ = db.rollback();
                return Err(commit_err.into());
            }
        }
        Err(_) => {
            if let Err(rollback_err) = db.rollback() {
                log::warn!("Rollback failed: {rollback_err}");
            }
        }
    }
    result
}

/// DDL needed to move between two schemas, in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaChanges {
    /// Statements migrating `from` to `to`
    pub up: Vec<String>,
    /// Statements migrating `to` back to `from`
    pub down: Vec<String>,
}

impl SchemaChanges {
    /// Returns `true` if neither direction has statements.
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}

/// Platform-specific DDL generation between two schemas.
pub trait SchemaDiffer {
    /// Platform name, matching [`Database::db_type`] of the target database
    fn name(&self) -> &'static str;

    /// Statements that turn `from` into `to`
    fn migrate_sql(&self, from: &Schema, to: &Schema) -> Vec<String>;

    /// Statements in both directions
    fn diff(&self, from: &Schema, to: &Schema) -> SchemaChanges {
        SchemaChanges {
            up: self.migrate_sql(from, to),
            down: self.migrate_sql(to, from),
        }
    }
}
