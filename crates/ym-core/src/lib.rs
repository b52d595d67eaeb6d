//! ym-core - Core library for Yam
//!
//! This crate provides the shared types used across all Yam components:
//! migration version identifiers, migration direction, SQL statements with
//! typed parameters, `migrations.yml` configuration parsing, and the two
//! schema models (the normalized [`Schema`] and the declarative
//! [`SchemaSnapshot`]).

pub mod config;
pub mod direction;
pub mod error;
pub mod schema;
pub mod snapshot;
pub mod statement;
pub mod version;

pub use config::{Config, DatabaseConfig, MigrationEntry};
pub use direction::Direction;
pub use error::{CoreError, CoreResult};
pub use schema::{Column, ForeignKey, Index, Schema, Sequence, Table};
pub use snapshot::{
    ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, SchemaSnapshot, SequenceSnapshot,
    TableSnapshot,
};
pub use statement::{SqlValue, Statement};
pub use version::MigrationVersion;
