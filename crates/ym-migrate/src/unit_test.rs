use super::*;
use crate::reporter::BufferReporter;

// ── Helpers ──────────────────────────────────────────────────────────

fn version() -> MigrationVersion {
    MigrationVersion::new("20230101000000").unwrap()
}

struct CreateUsers;

impl MigrationUnit for CreateUsers {
    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.skip_if(ctx.schema().has_table("users"), "users exists")?;
        ctx.add_sql("CREATE TABLE users (id INTEGER)");
        Ok(())
    }

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        ctx.add_sql("DROP TABLE users");
        Ok(())
    }
}

// ── Guards ───────────────────────────────────────────────────────────

#[test]
fn test_abort_if() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    assert_eq!(ctx.abort_if(false, "nope"), Ok(()));
    assert_eq!(
        ctx.abort_if(true, "bad data"),
        Err(HookInterrupt::Abort("bad data".to_string()))
    );
}

#[test]
fn test_empty_message_becomes_unknown_reason() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    assert_eq!(
        ctx.abort_if(true, ""),
        Err(HookInterrupt::Abort(UNKNOWN_REASON.to_string()))
    );
    assert_eq!(
        ctx.skip_if(true, ""),
        Err(HookInterrupt::Skip(UNKNOWN_REASON.to_string()))
    );
}

#[test]
fn test_irreversible_default_message() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    assert_eq!(
        ctx.irreversible(""),
        Err(HookInterrupt::Abort(IRREVERSIBLE_MESSAGE.to_string()))
    );
    assert_eq!(
        ctx.irreversible("data is lost"),
        Err(HookInterrupt::Abort("data is lost".to_string()))
    );
}

#[test]
fn test_warn_if_reports_state() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let mut ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    ctx.warn_if(false, "quiet");
    assert!(reporter.lines().is_empty());

    ctx.set_state(ExecutionState::PostProcessing);
    ctx.warn_if(true, "slow index");
    assert!(reporter.contains("Warning during Post-Processing: slow index"));
}

// ── Statements ───────────────────────────────────────────────────────

#[test]
fn test_add_sql_keeps_order_and_params() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let mut ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    ctx.add_sql("CREATE TABLE t (id INTEGER)");
    ctx.add_sql_with_params("INSERT INTO t VALUES (?)", vec![SqlValue::Int(1)]);

    let statements = ctx.into_statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].sql, "CREATE TABLE t (id INTEGER)");
    assert!(!statements[0].has_params());
    assert_eq!(statements[1].params, vec![SqlValue::Int(1)]);
}

#[test]
fn test_unit_sees_schema() {
    let v = version();
    let mut schema = Schema::default();
    let reporter = BufferReporter::new();

    let mut ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);
    assert_eq!(CreateUsers.up(&mut ctx), Ok(()));
    assert_eq!(ctx.statements().len(), 1);

    schema.tables.push(ym_core::Table::new("users"));
    let mut ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);
    assert_eq!(
        CreateUsers.up(&mut ctx),
        Err(HookInterrupt::Skip("users exists".to_string()))
    );
    assert!(ctx.statements().is_empty());
}

#[test]
fn test_default_hooks_are_noops() {
    let v = version();
    let schema = Schema::default();
    let reporter = BufferReporter::new();
    let mut ctx = MigrationContext::new(&v, "duckdb", &schema, &reporter);

    let mut unit = CreateUsers;
    assert_eq!(unit.pre_up(&mut ctx), Ok(()));
    assert_eq!(unit.post_up(&mut ctx), Ok(()));
    assert_eq!(unit.pre_down(&mut ctx), Ok(()));
    assert_eq!(unit.post_down(&mut ctx), Ok(()));
    assert!(unit.name().is_none());
    assert!(ctx.statements().is_empty());
}

#[test]
fn test_factory_builds_fresh_units() {
    let build = factory(|init: &UnitInit| {
        assert_eq!(init.platform, "duckdb");
        CreateUsers
    });
    let db: Arc<dyn Database> = Arc::new(ym_db::DuckDbBackend::in_memory().unwrap());
    let init = UnitInit {
        version: version(),
        platform: "duckdb".to_string(),
        database: db,
        reporter: Arc::new(BufferReporter::new()),
    };
    let unit = build(&init);
    assert!(unit.name().is_none());
}
