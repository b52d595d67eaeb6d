//! DuckDB DDL generation.
//!
//! [`DuckDbPlatform`] compares two [`Schema`]s and emits the statements that
//! turn one into the other. Statements are ordered so that every one of them
//! can run against the state left by the previous ones:
//!
//! 1. new and changed sequences
//! 2. new tables, referenced tables first
//! 3. altered tables
//! 4. dropped tables, referencing tables first
//! 5. dropped sequences
//!
//! DuckDB cannot add or drop constraints on an existing table, so changes to
//! primary keys, unique constraints and foreign keys of a table that exists on
//! both sides are logged and left out.

use crate::traits::SchemaDiffer;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use ym_core::schema::{OPT_LENGTH, OPT_PRECISION, OPT_SCALE};
use ym_core::{Column, ForeignKey, Index, Schema, Sequence, Table};

/// Words that must be quoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "any", "as", "asc", "between", "by", "case", "cast", "check",
    "column", "constraint", "create", "default", "delete", "desc", "distinct", "drop", "else",
    "end", "exists", "false", "for", "foreign", "from", "group", "having", "in", "index",
    "insert", "into", "is", "join", "key", "like", "limit", "not", "null", "offset", "on", "or",
    "order", "primary", "references", "select", "sequence", "set", "table", "then", "to", "true",
    "union", "unique", "update", "user", "using", "values", "when", "where", "with",
];

/// Quote an identifier unless it is a plain lowercase, non-reserved name.
pub fn quote_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED_WORDS.contains(&name);
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_identifier(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DDL generator for DuckDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbPlatform;

impl SchemaDiffer for DuckDbPlatform {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn migrate_sql(&self, from: &Schema, to: &Schema) -> Vec<String> {
        let mut sql = Vec::new();

        for seq in &to.sequences {
            match from.sequence(&seq.name) {
                None => sql.push(create_sequence(seq)),
                Some(old) if old != seq => {
                    sql.push(drop_sequence(old));
                    sql.push(create_sequence(seq));
                }
                Some(_) => {}
            }
        }

        let created: Vec<&Table> = to
            .tables
            .iter()
            .filter(|t| !from.has_table(&t.name))
            .collect();
        for table in dependency_order(&created) {
            sql.push(create_table(table));
            for index in table.indexes.iter().filter(|i| !i.is_constraint()) {
                sql.push(create_index(&table.name, index));
            }
        }

        for table in &to.tables {
            if let Some(old) = from.table(&table.name) {
                if old != table {
                    sql.extend(alter_table(old, table));
                }
            }
        }

        let dropped: Vec<&Table> = from
            .tables
            .iter()
            .filter(|t| !to.has_table(&t.name))
            .collect();
        for table in dependency_order(&dropped).into_iter().rev() {
            sql.push(format!("DROP TABLE {}", quote_identifier(&table.name)));
        }

        for seq in &from.sequences {
            if to.sequence(&seq.name).is_none() {
                sql.push(drop_sequence(seq));
            }
        }

        sql
    }
}

/// Order tables so that each comes after the tables it references.
///
/// References to tables outside `tables` are ignored. On a reference cycle
/// the input order is kept.
fn dependency_order<'a>(tables: &[&'a Table]) -> Vec<&'a Table> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    for (pos, table) in tables.iter().enumerate() {
        nodes.insert(table.name.as_str(), graph.add_node(pos));
    }
    for table in tables {
        let to = nodes[table.name.as_str()];
        for fk in &table.foreign_keys {
            if fk.foreign_table == table.name {
                continue;
            }
            if let Some(&from) = nodes.get(fk.foreign_table.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|idx| tables[graph[idx]]).collect(),
        Err(cycle) => {
            log::warn!(
                "Foreign keys of table {} form a cycle, keeping declaration order",
                tables[graph[cycle.node_id()]].name
            );
            tables.to_vec()
        }
    }
}

/// The column type with length or precision options applied.
fn column_type(column: &Column) -> String {
    let base = column.column_type.clone();
    if base.contains('(') {
        return base;
    }
    let int_opt = |key: &str| column.options.get(key).and_then(serde_yaml::Value::as_i64);
    if let Some(length) = int_opt(OPT_LENGTH) {
        return format!("{base}({length})");
    }
    match (int_opt(OPT_PRECISION), int_opt(OPT_SCALE)) {
        (Some(p), Some(s)) => format!("{base}({p}, {s})"),
        (Some(p), None) => format!("{base}({p})"),
        _ => base,
    }
}

fn column_definition(column: &Column) -> String {
    let mut def = format!("{} {}", quote_identifier(&column.name), column_type(column));
    if column.not_null() {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = column.default_expr() {
        def.push_str(" DEFAULT ");
        def.push_str(&default);
    }
    def
}

fn foreign_key_clause(fk: &ForeignKey) -> String {
    format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        quote_list(&fk.columns),
        quote_identifier(&fk.foreign_table),
        quote_list(&fk.foreign_columns)
    )
}

fn create_table(table: &Table) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(column_definition).collect();
    if let Some(pk) = table.primary_key() {
        parts.push(format!("PRIMARY KEY ({})", quote_list(&pk.columns)));
    }
    for index in table
        .indexes
        .iter()
        .filter(|i| i.is_constraint() && !i.primary)
    {
        parts.push(format!("UNIQUE ({})", quote_list(&index.columns)));
    }
    for fk in &table.foreign_keys {
        parts.push(foreign_key_clause(fk));
    }
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&table.name),
        parts.join(", ")
    )
}

fn create_index(table: &str, index: &Index) -> String {
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        quote_identifier(&index.name),
        quote_identifier(table),
        quote_list(&index.columns)
    )
}

fn create_sequence(seq: &Sequence) -> String {
    format!(
        "CREATE SEQUENCE {} START WITH {} INCREMENT BY {}",
        quote_identifier(&seq.name),
        seq.initial_value,
        seq.allocation_size
    )
}

fn drop_sequence(seq: &Sequence) -> String {
    format!("DROP SEQUENCE {}", quote_identifier(&seq.name))
}

fn alter_table(from: &Table, to: &Table) -> Vec<String> {
    let table = quote_identifier(&to.name);
    let mut sql = Vec::new();

    let standalone = |t: &Table| -> Vec<Index> {
        t.indexes
            .iter()
            .filter(|i| !i.is_constraint())
            .cloned()
            .collect()
    };
    let old_indexes = standalone(from);
    let new_indexes = standalone(to);

    for index in &old_indexes {
        if to.index(&index.name) != Some(index) {
            sql.push(format!("DROP INDEX {}", quote_identifier(&index.name)));
        }
    }

    for column in &from.columns {
        if to.column(&column.name).is_none() {
            sql.push(format!(
                "ALTER TABLE {table} DROP COLUMN {}",
                quote_identifier(&column.name)
            ));
        }
    }

    for column in &to.columns {
        let name = quote_identifier(&column.name);
        let Some(old) = from.column(&column.name) else {
            let mut add = format!("ALTER TABLE {table} ADD COLUMN {name} {}", column_type(column));
            if let Some(default) = column.default_expr() {
                add.push_str(" DEFAULT ");
                add.push_str(&default);
            }
            sql.push(add);
            if column.not_null() {
                sql.push(format!("ALTER TABLE {table} ALTER COLUMN {name} SET NOT NULL"));
            }
            continue;
        };

        if !column_type(old).eq_ignore_ascii_case(&column_type(column)) {
            sql.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {name} SET DATA TYPE {}",
                column_type(column)
            ));
        }
        if old.not_null() != column.not_null() {
            let action = if column.not_null() { "SET" } else { "DROP" };
            sql.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {name} {action} NOT NULL"
            ));
        }
        if old.default_expr() != column.default_expr() {
            match column.default_expr() {
                Some(default) => sql.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {name} SET DEFAULT {default}"
                )),
                None => sql.push(format!("ALTER TABLE {table} ALTER COLUMN {name} DROP DEFAULT")),
            }
        }
    }

    for index in &new_indexes {
        if from.index(&index.name) != Some(index) {
            sql.push(create_index(&to.name, index));
        }
    }

    let constraints = |t: &Table| -> Vec<Index> {
        t.indexes
            .iter()
            .filter(|i| i.is_constraint())
            .cloned()
            .collect()
    };
    if constraints(from) != constraints(to) || from.foreign_keys != to.foreign_keys {
        log::warn!(
            "Constraint changes on table {} cannot be expressed for DuckDB and were skipped",
            to.name
        );
    }

    sql
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
