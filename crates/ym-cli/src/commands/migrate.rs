//! Migrate command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{parse_version, version_line};
use crate::context::RuntimeContext;
use ym_migrate::{MigrateError, MigrationRunner};

/// Execute the migrate command
pub fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = RuntimeContext::new(global)?;
    let target = args.version.as_deref().map(parse_version).transpose()?;

    let unavailable = ctx.store.unavailable_migrated_versions()?;
    if !unavailable.is_empty() {
        println!(
            "WARNING! You have {} previously executed migrations in the database that are not registered migrations.",
            unavailable.len()
        );
        for version in &unavailable {
            println!("{}", version_line(version));
        }
    }

    let mut runner = MigrationRunner::new(&mut ctx.store);

    if let Some(path) = &args.write_sql {
        runner.write_sql_file(path, target.as_ref())?;
        return Ok(());
    }

    match runner.migrate(target.as_ref(), args.dry_run) {
        Ok(summary) if summary.is_empty() => println!("No migrations to execute."),
        Ok(_) => {}
        Err(MigrateError::NoMigrationsToExecute) => println!("No migrations to execute."),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
