//! Generation of new migration files.
//!
//! Two formats are written. SQL files are picked up by
//! [`MigrationStore::register_from_directory`](crate::MigrationStore::register_from_directory);
//! Rust files implement [`MigrationUnit`](crate::MigrationUnit) and are meant
//! to be added to a crate that registers them itself.

use crate::converter::{diff_against_snapshot, escape_literal};
use crate::error::{MigrateError, MigrateResult};
use crate::sql_file::SqlFileMigration;
use crate::store::MigrationStore;
use chrono::NaiveDateTime;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ym_core::{MigrationVersion, SchemaSnapshot};
use ym_db::SchemaDiffer;

const RUST_TEMPLATE: &str = r#"//! Migration <version> (<namespace>)

use ym_migrate::{HookResult, MigrationContext, MigrationUnit};

/// Auto-generated migration: please modify to your needs!
pub struct Version<version>;

impl MigrationUnit for Version<version> {
    fn up(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        // this up() migration is auto-generated, please modify it to your needs
<up>
        Ok(())
    }

    fn down(&mut self, ctx: &mut MigrationContext<'_>) -> HookResult {
        // this down() migration is auto-generated, please modify it to your needs
<down>
        Ok(())
    }
}
"#;

const SQL_TEMPLATE: &str = "<header>-- Auto-generated migration: please modify to your needs!

-- +up
<up>
-- +down
<down>";

const RUST_INDENT: &str = "        ";

/// Output format of a generated migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    /// `Version<id>.sql`, loadable from the migrations directory
    #[default]
    Sql,
    /// `Version<id>.rs`, a [`MigrationUnit`](crate::MigrationUnit) impl
    Rust,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Sql => "sql",
            ArtifactFormat::Rust => "rs",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Sql => write!(f, "sql"),
            ArtifactFormat::Rust => write!(f, "rust"),
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(ArtifactFormat::Sql),
            "rust" | "rs" => Ok(ArtifactFormat::Rust),
            other => Err(format!("unknown migration format '{other}': expected sql or rust")),
        }
    }
}

/// Version id for a migration created at `now`.
pub fn new_version_id(now: NaiveDateTime) -> MigrationVersion {
    MigrationVersion::from_datetime(now)
}

/// Write an empty migration and return its path.
pub fn generate_blank(
    store: &MigrationStore,
    version: &MigrationVersion,
    format: ArtifactFormat,
) -> MigrateResult<PathBuf> {
    let code = render(store, version, format, None, &[], &[]);
    write_artifact(store, version, format, &code)
}

/// Write a migration that moves the live database to `snapshot`.
///
/// Returns `None` without writing anything when there is nothing to change.
pub fn generate_diff(
    store: &MigrationStore,
    differ: &dyn SchemaDiffer,
    snapshot: &SchemaSnapshot,
    version: &MigrationVersion,
    format: ArtifactFormat,
) -> MigrateResult<Option<PathBuf>> {
    let changes = diff_against_snapshot(store, differ, snapshot)?;
    if changes.is_empty() {
        return Ok(None);
    }
    let code = render(
        store,
        version,
        format,
        Some(differ.name()),
        &changes.up,
        &changes.down,
    );
    write_artifact(store, version, format, &code).map(Some)
}

/// Render migration source without writing it.
pub(crate) fn render(
    store: &MigrationStore,
    version: &MigrationVersion,
    format: ArtifactFormat,
    platform: Option<&str>,
    up: &[String],
    down: &[String],
) -> String {
    match format {
        ArtifactFormat::Rust => RUST_TEMPLATE
            .replace("<namespace>", store.namespace().unwrap_or("migrations"))
            .replace("<version>", version.as_str())
            .replace("<up>", &rust_body(platform, up))
            .replace("<down>", &rust_body(platform, down)),
        ArtifactFormat::Sql => {
            let header = platform
                .map(|p| format!("-- yam:platform {p}\n"))
                .unwrap_or_default();
            SQL_TEMPLATE
                .replace("<header>", &header)
                .replace("<up>", &sql_body(up))
                .replace("<down>", &sql_body(down))
        }
    }
}

fn rust_body(platform: Option<&str>, statements: &[String]) -> String {
    let mut lines = Vec::new();
    if let Some(platform) = platform {
        lines.push(format!(
            "ctx.abort_if(ctx.platform() != \"{platform}\", \"Migration can only be executed safely on '{platform}'.\")?;"
        ));
        lines.push(String::new());
    }
    for sql in statements {
        lines.push(format!("ctx.add_sql(\"{}\");", escape_literal(sql)));
    }
    lines
        .iter()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{RUST_INDENT}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sql_body(statements: &[String]) -> String {
    statements.iter().map(|s| format!("{s};\n")).collect()
}

fn target_directory(store: &MigrationStore) -> MigrateResult<PathBuf> {
    let dir = match store.migrations_directory() {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| MigrateError::io(Path::new("."), e))?,
    };
    if !dir.is_dir() {
        return Err(MigrateError::io(
            &dir,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "migrations directory does not exist",
            ),
        ));
    }
    Ok(dir)
}

fn write_artifact(
    store: &MigrationStore,
    version: &MigrationVersion,
    format: ArtifactFormat,
    code: &str,
) -> MigrateResult<PathBuf> {
    let dir = target_directory(store)?;
    let path = match format {
        ArtifactFormat::Sql => dir.join(SqlFileMigration::file_name(version)),
        ArtifactFormat::Rust => dir.join(format!("Version{version}.{}", format.extension())),
    };
    std::fs::write(&path, code).map_err(|e| MigrateError::io(&path, e))?;
    log::debug!("Wrote migration {}", path.display());
    Ok(path)
}

#[cfg(test)]
#[path = "codegen_test.rs"]
mod tests;
