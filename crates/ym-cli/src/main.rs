//! Yam CLI - versioned database schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::{diff, execute, generate, latest, migrate, schema_reverse, status, version};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Execute(args) => execute::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::Version(args) => version::execute(args, &cli.global),
        cli::Commands::Latest => latest::execute(&cli.global),
        cli::Commands::Generate(args) => generate::execute(args, &cli.global),
        cli::Commands::Diff(args) => diff::execute(args, &cli.global),
        cli::Commands::SchemaReverse(args) => schema_reverse::execute(args, &cli.global),
    }
}
