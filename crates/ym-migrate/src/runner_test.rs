use super::*;
use crate::reporter::BufferReporter;
use crate::unit::{factory, HookResult, MigrationContext, MigrationUnit};
use std::sync::Arc;
use ym_db::{Database, DuckDbBackend};

// ── Helpers ──────────────────────────────────────────────────────────

/// Creates table `name` on up, drops it on down.
#[derive(Clone)]
struct TableUnit {
    name: &'static str,
}

impl MigrationUnit for TableUnit {
    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.add_sql(format!("CREATE TABLE {} (id INTEGER)", self.name));
        Ok(())
    }

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.add_sql(format!("DROP TABLE {}", self.name));
        Ok(())
    }
}

const V1: &str = "20230101000000";
const V2: &str = "20230102000000";
const V3: &str = "20230103000000";

fn v(id: &str) -> MigrationVersion {
    MigrationVersion::new(id).unwrap()
}

fn store(buffer: &Arc<BufferReporter>) -> MigrationStore {
    let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let mut s = MigrationStore::new(db, buffer.clone());
    for (id, name) in [(V1, "a"), (V2, "b"), (V3, "c")] {
        let unit = TableUnit { name };
        s.register(v(id), factory(move |_| unit.clone())).unwrap();
    }
    s
}

// ── migrate ──────────────────────────────────────────────────────────

#[test]
fn test_migrate_to_latest() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);
    let summary = MigrationRunner::new(&mut s).migrate(None, false).unwrap();

    assert_eq!(summary.direction, Direction::Up);
    assert!(summary.from.is_zero());
    assert_eq!(summary.to, v(V3));
    assert_eq!(summary.versions_executed(), 3);
    assert_eq!(summary.statement_count(), 3);
    assert_eq!(
        summary.statements_for(&v(V2)).unwrap()[0].sql,
        "CREATE TABLE b (id INTEGER)"
    );
    assert_eq!(s.current_version().unwrap(), v(V3));
    assert!(buffer.contains("Migrating up to 20230103000000 from 0"));
    assert!(buffer.contains("++ 3 migrations executed"));
    assert!(buffer.contains("++ 3 sql queries"));
}

#[test]
fn test_migrate_when_up_to_date_is_empty() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);
    MigrationRunner::new(&mut s).migrate(None, false).unwrap();

    let summary = MigrationRunner::new(&mut s).migrate(None, false).unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.from, summary.to);
}

#[test]
fn test_migrate_partial_then_down() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);

    let summary = MigrationRunner::new(&mut s)
        .migrate(Some(&v(V2)), false)
        .unwrap();
    assert_eq!(
        summary.executed.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>(),
        vec![v(V1), v(V2)]
    );
    assert!(!s.database().relation_exists("c").unwrap());

    let summary = MigrationRunner::new(&mut s)
        .migrate(Some(&v(V1)), false)
        .unwrap();
    assert_eq!(summary.direction, Direction::Down);
    assert_eq!(summary.versions_executed(), 1);
    assert!(!s.database().relation_exists("b").unwrap());
    assert!(s.database().relation_exists("a").unwrap());
    assert_eq!(s.current_version().unwrap(), v(V1));
}

#[test]
fn test_migrate_down_to_zero() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);
    MigrationRunner::new(&mut s).migrate(None, false).unwrap();

    let summary = MigrationRunner::new(&mut s)
        .migrate(Some(&MigrationVersion::zero()), false)
        .unwrap();

    assert_eq!(summary.direction, Direction::Down);
    assert_eq!(
        summary.executed.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>(),
        vec![v(V3), v(V2), v(V1)]
    );
    assert!(s.migrated_versions().unwrap().is_empty());
}

#[test]
fn test_migrate_unknown_target() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);
    let err = MigrationRunner::new(&mut s)
        .migrate(Some(&v("20990101000000")), false)
        .unwrap_err();
    assert!(matches!(err, MigrateError::UnknownVersion { .. }));
    assert!(s.migrated_versions().unwrap().is_empty());
}

#[test]
fn test_migrate_empty_registry() {
    let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let mut s = MigrationStore::new(db, Arc::new(BufferReporter::new()));
    let err = MigrationRunner::new(&mut s).migrate(None, false).unwrap_err();
    assert!(matches!(err, MigrateError::NoMigrationsToExecute));
}

#[test]
fn test_dry_run_leaves_database_alone() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);

    let summary = MigrationRunner::new(&mut s).get_sql(None).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.statement_count(), 3);
    assert!(!s.database().relation_exists("a").unwrap());
    assert!(!s.database().relation_exists(s.tracking_table()).unwrap());
    assert!(buffer.contains("Executing dry run of migration up to 20230103000000 from 0"));
    assert!(buffer.contains("-> CREATE TABLE a (id INTEGER)"));
}

// ── Single versions ──────────────────────────────────────────────────

#[test]
fn test_execute_single_version() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);

    let statements = MigrationRunner::new(&mut s)
        .execute(&v(V2), Direction::Up, false)
        .unwrap();

    assert_eq!(statements.len(), 1);
    assert!(s.has_version_migrated(&v(V2)).unwrap());
    assert!(!s.has_version_migrated(&v(V1)).unwrap());
    assert_eq!(s.current_version().unwrap(), v(V2));
}

#[test]
fn test_execute_unknown_version() {
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);
    let err = MigrationRunner::new(&mut s)
        .execute(&v("20990101000000"), Direction::Up, false)
        .unwrap_err();
    assert!(matches!(err, MigrateError::UnknownVersion { .. }));
}

// ── SQL files ────────────────────────────────────────────────────────

#[test]
fn test_write_sql_file_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);

    let path = MigrationRunner::new(&mut s)
        .write_sql_file(dir.path(), Some(&v(V2)))
        .unwrap();

    let file_name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(file_name.starts_with("yam_migration_"));
    assert!(file_name.ends_with(".sql"));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("-- Yam Migration File Generated on "));
    assert!(contents.contains("-- Migrating from 0 to 20230102000000\n"));
    assert!(contents.contains("\n-- Version 20230101000000\nCREATE TABLE a (id INTEGER);\n"));
    assert!(contents.contains("\n-- Version 20230102000000\nCREATE TABLE b (id INTEGER);\n"));
    assert!(!contents.contains("CREATE TABLE c"));
    assert!(buffer.contains("Writing migration file to"));

    assert!(!s.database().relation_exists("a").unwrap());
}

#[test]
fn test_write_version_sql_file_to_path() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("down.sql");
    let buffer = Arc::new(BufferReporter::new());
    let mut s = store(&buffer);

    let path = MigrationRunner::new(&mut s)
        .write_version_sql_file(&target, &v(V3), Direction::Down)
        .unwrap();

    assert_eq!(path, target);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("-- Version 20230103000000 (down)\nDROP TABLE c;\n"));
}

#[test]
fn test_push_statements_renders_params() {
    let mut out = String::new();
    push_statements(
        &mut out,
        &[Statement::with_params(
            "INSERT INTO t VALUES (?, ?)",
            vec![SqlValue::Int(1), SqlValue::Text("it's".into())],
        )],
    );
    assert_eq!(out, "-- params: 1, 'it''s'\nINSERT INTO t VALUES (?, ?);\n");
}
