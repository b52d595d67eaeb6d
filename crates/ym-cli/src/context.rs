//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::sync::Arc;
use ym_core::Config;
use ym_db::{Database, DuckDbBackend};
use ym_migrate::{MigrationStore, Reporter};

use crate::cli::GlobalArgs;

/// Writes engine output straight to the terminal.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn write(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }
}

/// Loaded configuration plus a store wired to the configured database
pub struct RuntimeContext {
    pub config: Config,
    pub store: MigrationStore,
}

impl RuntimeContext {
    /// Load `migrations.yml`, connect to the database and register every
    /// migration the configuration points at.
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let config = Config::load(&args.config).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                args.config.display()
            )
        })?;

        let db_path = args
            .database
            .clone()
            .unwrap_or_else(|| config.database_path());
        log::debug!("Connecting to database {db_path}");
        let db: Arc<dyn Database> =
            Arc::new(DuckDbBackend::new(&db_path).context("Failed to connect to database")?);

        let store = MigrationStore::from_config(&config, db, Arc::new(ConsoleReporter))
            .context("Failed to register migrations")?;
        store.validate()?;

        Ok(Self { config, store })
    }
}
