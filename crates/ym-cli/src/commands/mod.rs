//! CLI command implementations

pub(crate) mod common;
pub(crate) mod diff;
pub(crate) mod execute;
pub(crate) mod generate;
pub(crate) mod latest;
pub(crate) mod migrate;
pub(crate) mod schema_reverse;
pub(crate) mod status;
pub(crate) mod version;
