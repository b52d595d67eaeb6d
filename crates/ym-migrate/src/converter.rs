//! Conversion between schema snapshots and introspected schemas.
//!
//! Snapshots key everything by name, so converting a live schema sorts
//! tables, indexes, foreign keys and sequences by name. Columns keep their
//! ordinal order. Option dictionaries are copied as they are in both
//! directions.

use crate::error::MigrateResult;
use crate::store::MigrationStore;
use ym_core::{
    Column, ColumnSnapshot, ForeignKey, ForeignKeySnapshot, Index, IndexSnapshot, Schema,
    SchemaSnapshot, Sequence, SequenceSnapshot, Table, TableSnapshot,
};
use ym_db::{SchemaChanges, SchemaDiffer};

/// Declarative form of a live schema.
pub fn to_snapshot(schema: &Schema) -> SchemaSnapshot {
    let tables = schema
        .tables
        .iter()
        .map(|table| (table.name.clone(), table_snapshot(table)))
        .collect();
    let sequences = schema
        .sequences
        .iter()
        .map(|seq| {
            (
                seq.name.clone(),
                SequenceSnapshot {
                    allocation_size: seq.allocation_size,
                    initial_size: seq.initial_value,
                },
            )
        })
        .collect();
    SchemaSnapshot { tables, sequences }
}

fn table_snapshot(table: &Table) -> TableSnapshot {
    TableSnapshot {
        columns: table
            .columns
            .iter()
            .map(|c| ColumnSnapshot {
                name: c.name.clone(),
                column_type: c.column_type.clone(),
                options: c.options.clone(),
            })
            .collect(),
        indexes: table
            .indexes
            .iter()
            .map(|i| {
                (
                    i.name.clone(),
                    IndexSnapshot {
                        columns: i.columns.clone(),
                        unique: i.unique,
                        primary: i.primary,
                        flags: i.flags.clone(),
                    },
                )
            })
            .collect(),
        foreign_keys: table
            .foreign_keys
            .iter()
            .map(|fk| {
                (
                    fk.name.clone(),
                    ForeignKeySnapshot {
                        columns: fk.columns.clone(),
                        foreign_table: fk.foreign_table.clone(),
                        foreign_columns: fk.foreign_columns.clone(),
                        options: fk.options.clone(),
                    },
                )
            })
            .collect(),
    }
}

/// Normalized schema described by a snapshot.
pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Schema {
    let tables = snapshot
        .tables
        .iter()
        .map(|(name, t)| Table {
            name: name.clone(),
            columns: t
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    column_type: c.column_type.clone(),
                    options: c.options.clone(),
                })
                .collect(),
            indexes: t
                .indexes
                .iter()
                .map(|(index_name, i)| Index {
                    name: index_name.clone(),
                    columns: i.columns.clone(),
                    unique: i.unique,
                    primary: i.primary,
                    flags: i.flags.clone(),
                })
                .collect(),
            foreign_keys: t
                .foreign_keys
                .iter()
                .map(|(fk_name, fk)| ForeignKey {
                    name: fk_name.clone(),
                    columns: fk.columns.clone(),
                    foreign_table: fk.foreign_table.clone(),
                    foreign_columns: fk.foreign_columns.clone(),
                    options: fk.options.clone(),
                })
                .collect(),
        })
        .collect();
    let sequences = snapshot
        .sequences
        .iter()
        .map(|(name, s)| Sequence {
            name: name.clone(),
            allocation_size: s.allocation_size,
            initial_value: s.initial_size,
        })
        .collect();
    Schema { tables, sequences }
}

/// Drop statements that mention the ledger table.
pub fn filter_tracking_table(statements: Vec<String>, tracking_table: &str) -> Vec<String> {
    statements
        .into_iter()
        .filter(|sql| !sql.contains(tracking_table))
        .collect()
}

/// Escape SQL for a double-quoted string literal in generated source.
pub fn escape_literal(sql: &str) -> String {
    sql.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Statements that move the live database to `snapshot`, and back.
///
/// Statements touching the ledger table are left out in both directions.
pub fn diff_against_snapshot(
    store: &MigrationStore,
    differ: &dyn SchemaDiffer,
    snapshot: &SchemaSnapshot,
) -> MigrateResult<SchemaChanges> {
    let live = store.database().introspect_schema()?;
    let target = from_snapshot(snapshot);
    let changes = differ.diff(&live, &target);
    Ok(SchemaChanges {
        up: filter_tracking_table(changes.up, store.tracking_table()),
        down: filter_tracking_table(changes.down, store.tracking_table()),
    })
}

#[cfg(test)]
#[path = "converter_test.rs"]
mod tests;
