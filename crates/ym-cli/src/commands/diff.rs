//! Diff command implementation

use anyhow::{bail, Context, Result};
use chrono::Local;
use ym_core::SchemaSnapshot;
use ym_db::DuckDbPlatform;
use ym_migrate::{generate_diff, new_version_id};

use crate::cli::{DiffArgs, GlobalArgs};
use crate::commands::common::schema_file;
use crate::context::RuntimeContext;

/// Execute the diff command
pub fn execute(args: &DiffArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let path = schema_file(&ctx.config, args.schema.as_ref());
    if !path.exists() {
        bail!("File \"{}\" not found.", path.display());
    }
    let snapshot = SchemaSnapshot::load(&path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;

    let version = new_version_id(Local::now().naive_local());
    match generate_diff(
        &ctx.store,
        &DuckDbPlatform,
        &snapshot,
        &version,
        args.format.into(),
    )? {
        Some(generated) => println!(
            "Generated new migration class to \"{}\" from schema differences.",
            generated.display()
        ),
        None => println!("No changes detected in your mapping information."),
    }
    Ok(())
}
