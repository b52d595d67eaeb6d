use super::*;
use crate::reporter::BufferReporter;
use crate::unit::factory;
use ym_db::DuckDbBackend;

// ── Helpers ──────────────────────────────────────────────────────────

const TABLE: &str = "yam_migration_versions";

struct Fixture {
    database: Arc<dyn Database>,
    reporter: Arc<dyn Reporter>,
    buffer: Arc<BufferReporter>,
}

impl Fixture {
    fn new() -> Self {
        let database: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
        database
            .execute(&format!(
                "CREATE TABLE {TABLE} (version VARCHAR(255) PRIMARY KEY)"
            ))
            .unwrap();
        let buffer = Arc::new(BufferReporter::new());
        Self {
            database,
            reporter: buffer.clone(),
            buffer,
        }
    }

    fn env(&self) -> ExecutionEnv<'_> {
        ExecutionEnv {
            database: &self.database,
            reporter: &self.reporter,
            tracking_table: TABLE,
        }
    }

    fn ledger(&self) -> Vec<String> {
        self.database
            .query_column(&format!("SELECT version FROM {TABLE} ORDER BY version"), &[])
            .unwrap()
    }
}

#[derive(Default, Clone)]
struct Scripted {
    up: Vec<&'static str>,
    down: Vec<&'static str>,
    post_up: Vec<&'static str>,
    pre_up_interrupt: Option<HookInterrupt>,
    post_up_interrupt: Option<HookInterrupt>,
    name: Option<&'static str>,
}

impl MigrationUnit for Scripted {
    fn pre_up(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        match self.pre_up_interrupt.clone() {
            Some(interrupt) => Err(interrupt),
            None => Ok(()),
        }
    }

    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        for sql in &self.up {
            ctx.add_sql(*sql);
        }
        Ok(())
    }

    fn post_up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        for sql in &self.post_up {
            ctx.add_sql(*sql);
        }
        match self.post_up_interrupt.clone() {
            Some(interrupt) => Err(interrupt),
            None => Ok(()),
        }
    }

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        for sql in &self.down {
            ctx.add_sql(*sql);
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        self.name.map(str::to_string)
    }
}

fn record(unit: Scripted) -> VersionRecord {
    VersionRecord::new(
        MigrationVersion::new("20230101000000").unwrap(),
        factory(move |_| unit.clone()),
    )
}

// ── Protocol ─────────────────────────────────────────────────────────

#[test]
fn test_execute_up_applies_and_records() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        name: Some("create users"),
        ..Default::default()
    });
    assert_eq!(rec.execution_state(), ExecutionState::NotExecuted);

    let statements = rec.execute(&fx.env(), Direction::Up, false).unwrap();

    assert_eq!(statements, vec![Statement::new("CREATE TABLE users (id INTEGER)")]);
    assert_eq!(rec.execution_state(), ExecutionState::Executed);
    assert_eq!(rec.name(), Some("create users"));
    assert!(fx.database.relation_exists("users").unwrap());
    assert_eq!(fx.ledger(), vec!["20230101000000".to_string()]);
    assert!(fx.buffer.contains("++ migrating 20230101000000 (create users)"));
}

#[test]
fn test_execute_down_removes_ledger_row() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        down: vec!["DROP TABLE users"],
        ..Default::default()
    });
    rec.execute(&fx.env(), Direction::Up, false).unwrap();
    rec.execute(&fx.env(), Direction::Down, false).unwrap();

    assert!(!fx.database.relation_exists("users").unwrap());
    assert!(fx.ledger().is_empty());
    assert!(fx.buffer.contains("-- reverting 20230101000000"));
}

#[test]
fn test_dry_run_captures_without_executing() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        ..Default::default()
    });

    let statements = rec.execute(&fx.env(), Direction::Up, true).unwrap();

    assert_eq!(statements.len(), 1);
    assert_eq!(rec.execution_state(), ExecutionState::Executed);
    assert!(!fx.database.relation_exists("users").unwrap());
    assert!(fx.ledger().is_empty());
}

#[test]
fn test_abort_in_pre_hook() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        pre_up_interrupt: Some(HookInterrupt::Abort("not today".into())),
        ..Default::default()
    });

    let err = rec.execute(&fx.env(), Direction::Up, false).unwrap_err();

    assert!(matches!(
        err,
        MigrateError::Abort { ref version, ref message }
            if version == "20230101000000" && message == "not today"
    ));
    assert_eq!(rec.execution_state(), ExecutionState::Error);
    assert!(!fx.database.relation_exists("users").unwrap());
    assert!(fx.ledger().is_empty());
}

#[test]
fn test_skip_leaves_ledger_untouched() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        pre_up_interrupt: Some(HookInterrupt::Skip("already there".into())),
        ..Default::default()
    });

    let err = rec.execute(&fx.env(), Direction::Up, false).unwrap_err();

    assert!(matches!(err, MigrateError::Skipped { .. }));
    assert_eq!(rec.execution_state(), ExecutionState::Skipped);
    assert!(fx.ledger().is_empty());
    assert!(fx.buffer.contains("SS skipped (Reason: already there)"));
}

struct Warns;

impl MigrationUnit for Warns {
    fn pre_up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.warn_if(true, "before");
        Ok(())
    }

    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.warn_if(true, "during");
        Ok(())
    }

    fn post_up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.warn_if(true, "after");
        Ok(())
    }

    fn down(&mut self, _ctx: &mut MigrationContext<'_>) -> HookResult {
        Ok(())
    }
}

#[test]
fn test_warnings_name_the_running_phase() {
    let fx = Fixture::new();
    let mut rec = VersionRecord::new(
        MigrationVersion::new("20230101000000").unwrap(),
        factory(|_| Warns),
    );

    rec.execute(&fx.env(), Direction::Up, false).unwrap();

    assert!(fx.buffer.contains("Warning during Pre-Processing: before"));
    assert!(fx.buffer.contains("Warning during Executing: during"));
    assert!(fx.buffer.contains("Warning during Post-Processing: after"));
}

#[test]
fn test_abort_in_post_hook_rolls_back() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        post_up_interrupt: Some(HookInterrupt::Abort("post check failed".into())),
        ..Default::default()
    });

    let err = rec.execute(&fx.env(), Direction::Up, false).unwrap_err();

    assert!(matches!(err, MigrateError::Abort { .. }));
    assert!(!fx.database.relation_exists("users").unwrap());
    assert!(fx.ledger().is_empty());
}

#[test]
fn test_post_hook_statements_run_in_same_transaction() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)"],
        post_up: vec!["INSERT INTO users VALUES (1)"],
        ..Default::default()
    });

    let statements = rec.execute(&fx.env(), Direction::Up, false).unwrap();

    assert_eq!(statements.len(), 2);
    let rows = fx.database.query_column("SELECT id FROM users", &[]).unwrap();
    assert_eq!(rows, vec!["1".to_string()]);
}

#[test]
fn test_failing_statement_rolls_back_version() {
    let fx = Fixture::new();
    let mut rec = record(Scripted {
        up: vec!["CREATE TABLE users (id INTEGER)", "INSERT INTO missing VALUES (1)"],
        ..Default::default()
    });

    let err = rec.execute(&fx.env(), Direction::Up, false).unwrap_err();

    match err {
        MigrateError::DatabaseExecution {
            version, statement, ..
        } => {
            assert_eq!(version, "20230101000000");
            assert_eq!(statement, "INSERT INTO missing VALUES (1)");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(rec.execution_state(), ExecutionState::Error);
    assert!(!fx.database.relation_exists("users").unwrap());
    assert!(fx.ledger().is_empty());
}

#[test]
fn test_mark_migrated_and_back() {
    let fx = Fixture::new();
    let rec = record(Scripted::default());

    assert!(!rec.is_migrated(fx.database.as_ref(), TABLE).unwrap());
    rec.mark_migrated(fx.database.as_ref(), TABLE).unwrap();
    assert_eq!(fx.ledger(), vec!["20230101000000".to_string()]);
    assert!(rec.is_migrated(fx.database.as_ref(), TABLE).unwrap());

    rec.mark_not_migrated(fx.database.as_ref(), TABLE).unwrap();
    assert!(fx.ledger().is_empty());
}

#[test]
fn test_execution_state_labels() {
    assert_eq!(ExecutionState::PreProcessing.to_string(), "Pre-Processing");
    assert_eq!(ExecutionState::PostProcessing.to_string(), "Post-Processing");
    assert_eq!(ExecutionState::NotExecuted.to_string(), "Not Executed");
}
