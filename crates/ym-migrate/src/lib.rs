//! ym-migrate - Migration engine for Yam
//!
//! This crate provides the version state machine and execution engine:
//! the [`MigrationStore`] registry and its ledger table, the per-version
//! [`VersionRecord`] protocol, the [`MigrationRunner`], schema snapshot
//! conversion, and generation of new migration files.

pub mod codegen;
pub mod converter;
pub mod error;
pub mod record;
pub mod reporter;
pub mod runner;
pub mod sql_file;
pub mod status;
pub mod store;
pub mod unit;

pub use codegen::{generate_blank, generate_diff, new_version_id, ArtifactFormat};
pub use error::{ConfigurationError, MigrateError, MigrateResult};
pub use record::{ExecutionState, VersionRecord};
pub use reporter::{BufferReporter, LogReporter, Reporter};
pub use runner::{MigrationRunner, MigrationSummary};
pub use sql_file::SqlFileMigration;
pub use status::{MigrationStatus, VersionStatus};
pub use store::MigrationStore;
pub use unit::{
    factory, HookInterrupt, HookResult, MigrationContext, MigrationFactory, MigrationUnit,
    UnitInit,
};
