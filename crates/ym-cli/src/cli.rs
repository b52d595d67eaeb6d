//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use ym_migrate::ArtifactFormat;

/// Yam - versioned database schema migrations
#[derive(Parser, Debug)]
#[command(name = "ym")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the migrations configuration file
    #[arg(short, long, global = true, default_value = "migrations.yml")]
    pub config: PathBuf,

    /// Override the database path from the configuration
    #[arg(long, global = true, env = "YM_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate the database to a version, or to the latest available one
    Migrate(MigrateArgs),

    /// Execute a single migration version up or down
    Execute(ExecuteArgs),

    /// Show the status of migrations
    Status(StatusArgs),

    /// Manually add or delete a version in the version table
    Version(VersionArgs),

    /// Print the latest available version
    Latest,

    /// Generate a blank migration
    Generate(GenerateArgs),

    /// Generate a migration from the difference to a schema file
    Diff(DiffArgs),

    /// Save the current database schema to a schema file
    SchemaReverse(SchemaReverseArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Version to migrate to (default: latest, "0" reverts everything)
    pub version: Option<String>,

    /// Report the SQL that would run without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Write the SQL to a file instead of executing it (default: current directory)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".")]
    pub write_sql: Option<PathBuf>,
}

/// Arguments for the execute command
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Version to execute
    pub version: String,

    /// Execute the up migration (default)
    #[arg(long, conflicts_with = "down")]
    pub up: bool,

    /// Execute the down migration
    #[arg(long)]
    pub down: bool,

    /// Report the SQL that would run without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Write the SQL to a file instead of executing it (default: current directory)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".")]
    pub write_sql: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// List every available version and whether it is migrated
    #[arg(long)]
    pub show_versions: bool,

    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Version to add or delete
    pub version: String,

    /// Add the version to the version table
    #[arg(long, conflicts_with = "delete")]
    pub add: bool,

    /// Delete the version from the version table
    #[arg(long)]
    pub delete: bool,
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Format of the generated migration
    #[arg(short, long, value_enum, default_value = "sql")]
    pub format: FormatArg,
}

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Schema file to diff against (default: schema.yml in the schema directory)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Format of the generated migration
    #[arg(short, long, value_enum, default_value = "sql")]
    pub format: FormatArg,
}

/// Arguments for the schema-reverse command
#[derive(Args, Debug)]
pub struct SchemaReverseArgs {
    /// Schema file to write (default: schema.yml in the schema directory)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,
}

/// Generated migration formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Version<id>.sql with up and down sections
    Sql,
    /// Version<id>.rs implementing MigrationUnit
    Rust,
}

impl From<FormatArg> for ArtifactFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Sql => ArtifactFormat::Sql,
            FormatArg::Rust => ArtifactFormat::Rust,
        }
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
