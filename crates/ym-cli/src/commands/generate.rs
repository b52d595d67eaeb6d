//! Generate command implementation

use anyhow::Result;
use chrono::Local;
use ym_migrate::{generate_blank, new_version_id};

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the generate command
pub fn execute(args: &GenerateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let version = new_version_id(Local::now().naive_local());

    let path = generate_blank(&ctx.store, &version, args.format.into())?;
    println!("Generated new migration class to \"{}\"", path.display());
    Ok(())
}
