//! Schema-reverse command implementation

use anyhow::{Context, Result};
use ym_migrate::converter::to_snapshot;

use crate::cli::{GlobalArgs, SchemaReverseArgs};
use crate::commands::common::schema_file;
use crate::context::RuntimeContext;

/// Execute the schema-reverse command
pub fn execute(args: &SchemaReverseArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let path = schema_file(&ctx.config, args.schema.as_ref());

    let schema = ctx
        .store
        .database()
        .introspect_schema()
        .context("Failed to read the database schema")?
        .without_table(ctx.store.tracking_table());
    to_snapshot(&schema)
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Current database status is saved to \"{}\".", path.display());
    Ok(())
}
