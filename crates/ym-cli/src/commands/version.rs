//! Version command implementation
//!
//! Adds or deletes ledger rows without running anything.

use anyhow::{bail, Result};
use ym_migrate::MigrateError;

use crate::cli::{GlobalArgs, VersionArgs};
use crate::commands::common::parse_version;
use crate::context::RuntimeContext;

/// Execute the version command
pub fn execute(args: &VersionArgs, global: &GlobalArgs) -> Result<()> {
    if !args.add && !args.delete {
        bail!("You must specify whether you want to --add or --delete the specified version.");
    }

    let ctx = RuntimeContext::new(global)?;
    let version = parse_version(&args.version)?;
    let store = &ctx.store;

    if !store.has_version(&version) {
        return Err(MigrateError::UnknownVersion {
            version: version.into_inner(),
        }
        .into());
    }

    let migrated = store.has_version_migrated(&version)?;
    if args.add {
        if migrated {
            bail!("The version \"{version}\" already exists in the version table.");
        }
        store.mark_migrated(&version)?;
        println!("Added {version} to {}.", store.tracking_table());
    } else {
        if !migrated {
            bail!("The version \"{version}\" does not exist in the version table.");
        }
        store.mark_not_migrated(&version)?;
        println!("Deleted {version} from {}.", store.tracking_table());
    }
    Ok(())
}
