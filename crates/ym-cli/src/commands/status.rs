//! Status command implementation

use anyhow::Result;
use ym_migrate::MigrationStatus;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::version_line;
use crate::context::RuntimeContext;

/// Width the configuration labels are padded to
const LABEL_WIDTH: usize = 34;

/// Execute the status command
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let status = MigrationStatus::collect(&ctx.store)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    for line in render(&status, args.show_versions) {
        println!("{line}");
    }
    Ok(())
}

/// Text lines of the status report.
pub(crate) fn render(status: &MigrationStatus, show_versions: bool) -> Vec<String> {
    let mut lines = vec!["\n == Configuration\n".to_string()];

    let current = if status.current_version.is_zero() {
        "0".to_string()
    } else {
        format!(
            "{} ({})",
            status.current_version_formatted, status.current_version
        )
    };
    let latest = if status.latest_version.is_zero() {
        "0".to_string()
    } else {
        format!(
            "{} ({})",
            status.latest_version_formatted, status.latest_version
        )
    };
    let info = [
        ("Name", status.name.clone()),
        ("Database Driver", status.platform.clone()),
        ("Configuration Source", status.configuration_source.clone()),
        ("Version Table Name", status.tracking_table.clone()),
        (
            "Migrations Namespace",
            status.namespace.clone().unwrap_or_default(),
        ),
        (
            "Migrations Directory",
            status.migrations_directory.clone().unwrap_or_default(),
        ),
        ("Current Version", current),
        ("Latest Version", latest),
        ("Executed Migrations", status.executed_migrations.to_string()),
        (
            "Executed Unavailable Migrations",
            status.executed_unavailable_migrations.len().to_string(),
        ),
        ("Available Migrations", status.available_migrations.to_string()),
        ("New Migrations", status.new_migrations.to_string()),
    ];
    for (label, value) in info {
        lines.push(format!(
            "    >> {:<width$}{value}",
            format!("{label}:"),
            width = LABEL_WIDTH
        ));
    }

    if show_versions {
        if !status.versions.is_empty() {
            lines.push("\n == Available Migration Versions\n".to_string());
            for v in &status.versions {
                let state = if v.migrated { "migrated" } else { "not migrated" };
                lines.push(format!("{:<60}{state}", version_line(&v.version)));
            }
        }
        if !status.executed_unavailable_migrations.is_empty() {
            lines.push("\n == Previously Executed Unavailable Migration Versions\n".to_string());
            for v in &status.executed_unavailable_migrations {
                lines.push(version_line(v));
            }
        }
    }

    lines
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
