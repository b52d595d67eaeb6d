//! Live schema introspection for DuckDB.
//!
//! Reads `information_schema` and the `duckdb_*()` catalog functions and
//! builds a [`Schema`] in whatever order the catalog returns objects.

use crate::duckdb_backend::value_to_string;
use crate::error::{DbError, DbResult};
use duckdb::types::Value;
use duckdb::Connection;
use regex::Regex;
use std::sync::OnceLock;
use ym_core::schema::{OPT_DEFAULT, OPT_LENGTH, OPT_NOT_NULL};
use ym_core::{Column, ForeignKey, Index, Schema, Sequence, Table};

/// Name given to every primary key index.
pub(crate) const PRIMARY_INDEX_NAME: &str = "primary";

/// Build the full schema for `schema_name`.
pub(crate) fn introspect(conn: &Connection, schema_name: &str) -> DbResult<Schema> {
    let mut tables = Vec::new();
    for name in list_tables(conn, schema_name)? {
        tables.push(introspect_table(conn, schema_name, &name)?);
    }
    let sequences = list_sequences(conn, schema_name)?;
    Ok(Schema { tables, sequences })
}

/// Run `sql` with string parameters and return rows of string-coerced values.
fn query(conn: &Connection, sql: &str, params: &[&str]) -> DbResult<Vec<Vec<Option<String>>>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DbError::IntrospectionError(format!("prepare failed: {e}")))?;
    let rows = stmt
        .query_map(duckdb::params_from_iter(params.iter()), |row| {
            let col_count = row.as_ref().column_count();
            (0..col_count)
                .map(|i| row.get::<_, Value>(i).map(value_to_string))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|e| DbError::IntrospectionError(format!("query failed: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::IntrospectionError(format!("row error: {e}")))?;
    Ok(rows)
}

fn cell(row: &[Option<String>], idx: usize) -> Option<String> {
    row.get(idx).cloned().flatten()
}

fn list_tables(conn: &Connection, schema_name: &str) -> DbResult<Vec<String>> {
    let rows = query(
        conn,
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = ? AND table_type = 'BASE TABLE'",
        &[schema_name],
    )?;
    Ok(rows.iter().filter_map(|r| cell(r, 0)).collect())
}

fn introspect_table(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Table> {
    let mut table = Table::new(table_name);
    table.columns = list_columns(conn, schema_name, table_name)?;

    let (indexes, foreign_keys) = list_constraints(conn, schema_name, table_name)?;
    table.indexes = indexes;
    table.foreign_keys = foreign_keys;
    table
        .indexes
        .extend(list_indexes(conn, schema_name, table_name)?);
    Ok(table)
}

fn list_columns(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Vec<Column>> {
    let rows = query(
        conn,
        "SELECT column_name, data_type, is_nullable, column_default, character_maximum_length \
         FROM information_schema.columns \
         WHERE table_schema = ? AND table_name = ? \
         ORDER BY ordinal_position",
        &[schema_name, table_name],
    )?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name = cell(&row, 0).ok_or_else(|| {
            DbError::IntrospectionError(format!("column without name in {table_name}"))
        })?;
        let data_type = cell(&row, 1).unwrap_or_default();
        let not_null = cell(&row, 2).is_some_and(|v| v.eq_ignore_ascii_case("NO"));

        let mut column = Column::new(name, data_type)
            .with_option(OPT_NOT_NULL, not_null)
            .with_option(
                OPT_DEFAULT,
                cell(&row, 3).map_or(serde_yaml::Value::Null, serde_yaml::Value::from),
            );
        if let Some(length) = cell(&row, 4).and_then(|l| l.parse::<i64>().ok()) {
            column = column.with_option(OPT_LENGTH, length);
        }
        columns.push(column);
    }
    Ok(columns)
}

/// Primary key and unique constraints become indexes; foreign keys are
/// returned separately.
fn list_constraints(
    conn: &Connection,
    schema_name: &str,
    table_name: &str,
) -> DbResult<(Vec<Index>, Vec<ForeignKey>)> {
    let rows = query(
        conn,
        "SELECT constraint_type, array_to_string(constraint_column_names, ','), constraint_text \
         FROM duckdb_constraints() \
         WHERE schema_name = ? AND table_name = ? \
           AND constraint_type IN ('PRIMARY KEY', 'UNIQUE', 'FOREIGN KEY') \
         ORDER BY constraint_index",
        &[schema_name, table_name],
    )?;

    let mut indexes = Vec::new();
    let mut foreign_keys = Vec::new();
    for row in rows {
        let kind = cell(&row, 0).unwrap_or_default();
        let columns = split_column_list(&cell(&row, 1).unwrap_or_default());
        match kind.as_str() {
            "PRIMARY KEY" => indexes.push(Index {
                name: PRIMARY_INDEX_NAME.to_string(),
                columns,
                unique: true,
                primary: true,
                flags: Vec::new(),
            }),
            "UNIQUE" => indexes.push(Index {
                name: format!("{table_name}_{}_key", columns.join("_")),
                columns,
                unique: true,
                primary: false,
                flags: vec![Index::CONSTRAINT_FLAG.to_string()],
            }),
            "FOREIGN KEY" => {
                let text = cell(&row, 2).unwrap_or_default();
                let Some((foreign_table, foreign_columns)) = parse_references(&text) else {
                    log::warn!("Cannot parse foreign key on {table_name}: {text}");
                    continue;
                };
                foreign_keys.push(ForeignKey {
                    name: format!("{table_name}_{}_fkey", columns.join("_")),
                    columns,
                    foreign_table,
                    foreign_columns,
                    options: Default::default(),
                });
            }
            _ => {}
        }
    }
    Ok((indexes, foreign_keys))
}

/// Standalone indexes created with `CREATE INDEX`.
fn list_indexes(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Vec<Index>> {
    let rows = query(
        conn,
        "SELECT index_name, is_unique, sql FROM duckdb_indexes() \
         WHERE schema_name = ? AND table_name = ?",
        &[schema_name, table_name],
    )?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let name = cell(&row, 0)?;
            let unique = cell(&row, 1).is_some_and(|v| v == "true");
            let columns = cell(&row, 2)
                .map(|sql| parse_index_columns(&sql))
                .unwrap_or_default();
            Some(Index {
                name,
                columns,
                unique,
                primary: false,
                flags: Vec::new(),
            })
        })
        .collect())
}

fn list_sequences(conn: &Connection, schema_name: &str) -> DbResult<Vec<Sequence>> {
    let rows = query(
        conn,
        "SELECT sequence_name, start_value, increment_by FROM duckdb_sequences() \
         WHERE schema_name = ?",
        &[schema_name],
    )?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            Some(Sequence {
                name: cell(&row, 0)?,
                initial_value: cell(&row, 1)?.parse().ok()?,
                allocation_size: cell(&row, 2)?.parse().ok()?,
            })
        })
        .collect())
}

/// Split a comma-separated identifier list, stripping quotes and whitespace.
pub(crate) fn split_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Extract `(table, columns)` from `... REFERENCES table(col, ...)`.
pub(crate) fn parse_references(constraint_text: &str) -> Option<(String, Vec<String>)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?i)\bREFERENCES\s+("?[\w.]+"?)\s*\(([^)]*)\)"#)
            .expect("references regex is valid")
    });
    let caps = re.captures(constraint_text)?;
    let table = caps[1].trim_matches('"').to_string();
    Some((table, split_column_list(&caps[2])))
}

/// Extract the indexed columns from a `CREATE INDEX ... ON t(cols)` statement.
pub(crate) fn parse_index_columns(create_sql: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?is)\bON\s+"?[\w.]+"?\s*\((.*)\)\s*;?\s*$"#).expect("index regex is valid")
    });
    re.captures(create_sql)
        .map(|caps| split_column_list(&caps[1]))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "introspect_test.rs"]
mod tests;
