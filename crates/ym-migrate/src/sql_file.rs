//! Migrations written as plain SQL files.
//!
//! A file named `Version<YYYYMMDDHHMMSS>.sql` holds both directions:
//!
//! ```sql
//! -- yam:platform duckdb
//! -- yam:name create users
//!
//! -- +up
//! CREATE TABLE users (id INTEGER PRIMARY KEY);
//!
//! -- +down
//! DROP TABLE users;
//! ```
//!
//! Both headers are optional. Without a `-- +down` section the migration
//! cannot be reverted.

use crate::error::{ConfigurationError, MigrateError, MigrateResult};
use crate::unit::{factory, HookResult, MigrationContext, MigrationFactory, MigrationUnit};
use sqlparser::dialect::DuckDbDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use ym_core::MigrationVersion;

const FILE_PREFIX: &str = "Version";
const FILE_EXTENSION: &str = "sql";

const PLATFORM_DIRECTIVE: &str = "-- yam:platform";
const NAME_DIRECTIVE: &str = "-- yam:name";
const UP_MARKER: &str = "-- +up";
const DOWN_MARKER: &str = "-- +down";

/// A parsed SQL migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFileMigration {
    pub path: PathBuf,
    pub name: Option<String>,
    /// Platform the statements were written for
    pub platform: Option<String>,
    pub up: Vec<String>,
    /// `None` when the file has no down section
    pub down: Option<Vec<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Up,
    Down,
}

impl SqlFileMigration {
    /// Read and parse a migration file.
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MigrateError::io(path, e))?;
        Self::parse(path, &content)
    }

    /// Parse migration file text; `path` is only used in messages.
    pub fn parse(path: &Path, content: &str) -> MigrateResult<Self> {
        let invalid = |reason: String| -> MigrateError {
            ConfigurationError::InvalidMigrationFile {
                path: path.display().to_string(),
                reason,
            }
            .into()
        };

        let mut name = None;
        let mut platform = None;
        let mut section = Section::Header;
        let mut up_sql: Option<String> = None;
        let mut down_sql: Option<String> = None;

        for (lineno, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(value) = trimmed.strip_prefix(PLATFORM_DIRECTIVE) {
                platform = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                continue;
            }
            if let Some(value) = trimmed.strip_prefix(NAME_DIRECTIVE) {
                name = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                continue;
            }
            if trimmed.eq_ignore_ascii_case(UP_MARKER) {
                if up_sql.is_some() {
                    return Err(invalid(format!("duplicate '{UP_MARKER}' on line {}", lineno + 1)));
                }
                up_sql = Some(String::new());
                section = Section::Up;
                continue;
            }
            if trimmed.eq_ignore_ascii_case(DOWN_MARKER) {
                if down_sql.is_some() {
                    return Err(invalid(format!(
                        "duplicate '{DOWN_MARKER}' on line {}",
                        lineno + 1
                    )));
                }
                down_sql = Some(String::new());
                section = Section::Down;
                continue;
            }

            let target = match section {
                Section::Header => {
                    if trimmed.is_empty() || trimmed.starts_with("--") {
                        continue;
                    }
                    return Err(invalid(format!(
                        "statement on line {} comes before '{UP_MARKER}'",
                        lineno + 1
                    )));
                }
                Section::Up => up_sql.as_mut(),
                Section::Down => down_sql.as_mut(),
            };
            if let Some(buf) = target {
                buf.push_str(line);
                buf.push('\n');
            }
        }

        let up_sql = up_sql.ok_or_else(|| invalid(format!("missing '{UP_MARKER}' section")))?;
        let up = split_statements(&up_sql).map_err(&invalid)?;
        let down = down_sql
            .map(|sql| split_statements(&sql))
            .transpose()
            .map_err(&invalid)?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            platform,
            up,
            down,
        })
    }

    /// Version encoded in a `Version<YYYYMMDDHHMMSS>.sql` file name.
    pub fn version_from_path(path: &Path) -> Option<MigrationVersion> {
        if path.extension()?.to_str()? != FILE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let id = stem.strip_prefix(FILE_PREFIX)?;
        MigrationVersion::new(id).ok().filter(|v| !v.is_zero())
    }

    /// File name a version is stored under.
    pub fn file_name(version: &MigrationVersion) -> String {
        format!("{FILE_PREFIX}{version}.{FILE_EXTENSION}")
    }

    /// Migration files in `dir` (not recursive), ascending by version.
    pub fn discover(dir: &Path) -> MigrateResult<Vec<(MigrationVersion, PathBuf)>> {
        let entries = std::fs::read_dir(dir).map_err(|e| MigrateError::io(dir, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| MigrateError::io(dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            match Self::version_from_path(&path) {
                Some(version) => found.push((version, path)),
                None => log::debug!("Ignoring {} in migrations directory", path.display()),
            }
        }
        found.sort();
        Ok(found)
    }

    /// A factory handing out clones of this migration.
    pub fn into_factory(self) -> MigrationFactory {
        factory(move |_| self.clone())
    }

    fn check_platform(&self, ctx: &MigrationContext<'_>) -> HookResult {
        match &self.platform {
            Some(platform) => ctx.abort_if(
                ctx.platform() != platform.as_str(),
                &format!("Migration can only be executed safely on '{platform}'."),
            ),
            None => Ok(()),
        }
    }
}

impl MigrationUnit for SqlFileMigration {
    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        self.check_platform(ctx)?;
        for sql in &self.up {
            ctx.add_sql(sql.as_str());
        }
        Ok(())
    }

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        self.check_platform(ctx)?;
        let Some(down) = &self.down else {
            return ctx.irreversible("");
        };
        for sql in down {
            ctx.add_sql(sql.as_str());
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

/// Split SQL text into statements on top-level semicolons.
///
/// Semicolons inside string literals, quoted identifiers and comments do not
/// split. Segments holding only whitespace and comments are dropped.
pub fn split_statements(sql: &str) -> Result<Vec<String>, String> {
    let tokens = Tokenizer::new(&DuckDbDialect {}, sql)
        .tokenize_with_location()
        .map_err(|e| e.to_string())?;

    let mut boundaries = HashSet::new();
    let mut meaningful = Vec::new();
    let mut has_content = false;
    for token in &tokens {
        match &token.token {
            Token::SemiColon => {
                boundaries.insert((token.span.start.line, token.span.start.column));
                meaningful.push(has_content);
                has_content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => has_content = true,
        }
    }
    meaningful.push(has_content);

    let mut segments = Vec::new();
    let mut start = 0;
    let (mut line, mut column) = (1u64, 1u64);
    for (idx, ch) in sql.char_indices() {
        if boundaries.contains(&(line, column)) {
            segments.push(&sql[start..idx]);
            start = idx + ch.len_utf8();
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    segments.push(&sql[start..]);

    Ok(segments
        .into_iter()
        .zip(meaningful)
        .filter(|(_, keep)| *keep)
        .map(|(segment, _)| segment.trim().to_string())
        .collect())
}

#[cfg(test)]
#[path = "sql_file_test.rs"]
mod tests;
