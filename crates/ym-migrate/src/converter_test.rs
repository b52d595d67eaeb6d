use super::*;
use crate::reporter::BufferReporter;
use std::sync::Arc;
use ym_core::schema::{OPT_DEFAULT, OPT_NOT_NULL};
use ym_db::{Database, DuckDbBackend, DuckDbPlatform};

// ── Helpers ──────────────────────────────────────────────────────────

fn sample_schema() -> Schema {
    let mut users = Table::new("users");
    users.columns = vec![
        Column::new("id", "INTEGER").with_option(OPT_NOT_NULL, true),
        Column::new("email", "VARCHAR").with_option(OPT_DEFAULT, "'n/a'"),
    ];
    users.indexes = vec![
        Index {
            name: "users_email_idx".into(),
            columns: vec!["email".into()],
            unique: false,
            primary: false,
            flags: vec![],
        },
        Index {
            name: "primary".into(),
            columns: vec!["id".into()],
            unique: true,
            primary: true,
            flags: vec![],
        },
    ];

    let mut posts = Table::new("posts");
    posts.columns = vec![
        Column::new("id", "INTEGER"),
        Column::new("user_id", "INTEGER"),
    ];
    posts.foreign_keys = vec![ForeignKey {
        name: "posts_user_id_fkey".into(),
        columns: vec!["user_id".into()],
        foreign_table: "users".into(),
        foreign_columns: vec!["id".into()],
        options: Default::default(),
    }];

    Schema {
        tables: vec![users, posts],
        sequences: vec![Sequence {
            name: "post_seq".into(),
            allocation_size: 2,
            initial_value: 5,
        }],
    }
}

fn store() -> MigrationStore {
    let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    MigrationStore::new(db, Arc::new(BufferReporter::new()))
}

// ── Conversion ───────────────────────────────────────────────────────

#[test]
fn test_to_snapshot_keys_by_name() {
    let snapshot = to_snapshot(&sample_schema());

    assert_eq!(
        snapshot.tables.keys().collect::<Vec<_>>(),
        vec!["posts", "users"]
    );
    let users = &snapshot.tables["users"];
    assert_eq!(users.columns[0].name, "id");
    assert_eq!(users.columns[1].name, "email");
    assert_eq!(
        users.indexes.keys().collect::<Vec<_>>(),
        vec!["primary", "users_email_idx"]
    );
    assert!(users.indexes["primary"].primary);
    assert_eq!(
        snapshot.tables["posts"].foreign_keys["posts_user_id_fkey"].foreign_table,
        "users"
    );
    assert_eq!(snapshot.sequences["post_seq"].initial_size, 5);
    assert_eq!(snapshot.sequences["post_seq"].allocation_size, 2);
}

#[test]
fn test_from_snapshot_preserves_options() {
    let schema = from_snapshot(&to_snapshot(&sample_schema()));

    let users = schema.table("users").unwrap();
    let id = users.column("id").unwrap();
    assert!(id.not_null());
    let email = users.column("email").unwrap();
    assert_eq!(email.default_expr().as_deref(), Some("'n/a'"));
    assert_eq!(schema.sequence("post_seq").unwrap().initial_value, 5);
}

#[test]
fn test_snapshot_yaml_round_trip_is_stable() {
    let snapshot = to_snapshot(&sample_schema());
    let yaml = serde_yaml::to_string(&snapshot).unwrap();
    let reparsed: SchemaSnapshot = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(reparsed, snapshot);
}

// ── Helpers for generated code ───────────────────────────────────────

#[test]
fn test_filter_tracking_table() {
    let statements = vec![
        "CREATE TABLE users (id INTEGER)".to_string(),
        "DROP TABLE yam_migration_versions".to_string(),
    ];
    assert_eq!(
        filter_tracking_table(statements, "yam_migration_versions"),
        vec!["CREATE TABLE users (id INTEGER)".to_string()]
    );
}

#[test]
fn test_escape_literal() {
    assert_eq!(
        escape_literal(r#"CREATE TABLE "odd" (a VARCHAR DEFAULT 'x\y')"#),
        r#"CREATE TABLE \"odd\" (a VARCHAR DEFAULT 'x\\y')"#
    );
}

// ── Diffing against a live database ──────────────────────────────────

#[test]
fn test_diff_against_snapshot_skips_ledger_table() {
    let s = store();
    s.ensure_tracking_table().unwrap();
    s.database()
        .execute("CREATE TABLE users (id INTEGER)")
        .unwrap();

    let mut snapshot = to_snapshot(&s.database().introspect_schema().unwrap());
    snapshot.tables.remove(s.tracking_table());
    let mut posts = TableSnapshot::default();
    posts.columns.push(ColumnSnapshot {
        name: "id".into(),
        column_type: "INTEGER".into(),
        options: Default::default(),
    });
    snapshot.tables.insert("posts".into(), posts);

    let changes = diff_against_snapshot(&s, &DuckDbPlatform, &snapshot).unwrap();

    assert_eq!(changes.up.len(), 1);
    assert!(changes.up[0].starts_with("CREATE TABLE posts"));
    assert_eq!(changes.down, vec!["DROP TABLE posts".to_string()]);
}

#[test]
fn test_diff_against_matching_snapshot_is_empty() {
    let s = store();
    s.ensure_tracking_table().unwrap();
    let db = s.database();
    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR NOT NULL)")
        .unwrap();
    db.execute("CREATE INDEX users_email_idx ON users (email)")
        .unwrap();

    let snapshot = to_snapshot(&s.database().introspect_schema().unwrap());
    let changes = diff_against_snapshot(&s, &DuckDbPlatform, &snapshot).unwrap();

    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}
