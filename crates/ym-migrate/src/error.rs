//! Error types for ym-migrate

use thiserror::Error;
use ym_core::CoreError;
use ym_db::DbError;

/// Invalid registry or store configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Y001: No migrations namespace configured
    #[error("[Y001] Migrations namespace must be configured in order to use Yam migrations")]
    MissingNamespace,

    /// Y002: No migrations directory configured
    #[error("[Y002] Migrations directory must be configured in order to use Yam migrations")]
    MissingDirectory,

    /// Y003: Same version registered twice
    #[error("[Y003] Migration version {version} is already registered")]
    DuplicateVersion { version: String },

    /// Y004: A migration file could not be loaded
    #[error("[Y004] Invalid migration file '{path}': {reason}")]
    InvalidMigrationFile { path: String, reason: String },
}

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Y010: Target or requested version is not registered
    #[error("[Y010] Could not find migration version {version}")]
    UnknownVersion { version: String },

    /// Y011: Nothing eligible in the requested direction
    #[error("[Y011] Could not find any migrations to execute")]
    NoMigrationsToExecute,

    /// Y012: A guard aborted the version
    #[error("[Y012] Migration {version} was aborted: {message}")]
    Abort { version: String, message: String },

    /// Y013: A guard skipped the version
    #[error("[Y013] Migration {version} was skipped: {message}")]
    Skipped { version: String, message: String },

    /// Y014: A captured statement failed; the version was rolled back
    #[error("[Y014] Migration {version} failed executing '{statement}': {source}")]
    DatabaseExecution {
        version: String,
        statement: String,
        #[source]
        source: DbError,
    },

    /// Y015: Ledger or introspection access failed
    #[error("[Y015] {0}")]
    Database(#[from] DbError),

    /// Y016: File access failed
    #[error("[Y016] Failed to access '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MigrateError {
    /// Shorthand for [`MigrateError::Io`] with a path.
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
