//! Execute command implementation

use anyhow::Result;
use ym_core::Direction;
use ym_migrate::MigrationRunner;

use crate::cli::{ExecuteArgs, GlobalArgs};
use crate::commands::common::parse_version;
use crate::context::RuntimeContext;

/// Execute the execute command
pub fn execute(args: &ExecuteArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = RuntimeContext::new(global)?;
    let version = parse_version(&args.version)?;
    let direction = if args.down {
        Direction::Down
    } else {
        Direction::Up
    };

    let mut runner = MigrationRunner::new(&mut ctx.store);

    if let Some(path) = &args.write_sql {
        runner.write_version_sql_file(path, &version, direction)?;
        return Ok(());
    }

    runner.execute(&version, direction, args.dry_run)?;
    Ok(())
}
