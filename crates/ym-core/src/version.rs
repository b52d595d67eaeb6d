//! Strongly-typed migration version identifier.

use crate::error::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Width of a timestamp version (`YYYYMMDDHHMMSS`).
const VERSION_WIDTH: usize = 14;

/// Sentinel meaning "no version applied".
const ZERO: &str = "0";

/// A migration version identifier.
///
/// Either a fixed-width `YYYYMMDDHHMMSS` timestamp or the sentinel `"0"`.
/// Ordering is lexical on the underlying string, which equals chronological
/// ordering for fixed-width timestamps; the sentinel sorts before all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationVersion(String);

impl MigrationVersion {
    /// Parse a version, rejecting anything that is not `0` or 14 ASCII digits.
    pub fn new(version: impl Into<String>) -> CoreResult<Self> {
        let s = version.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidVersion { version: s })
        }
    }

    /// The `"0"` sentinel.
    pub fn zero() -> Self {
        Self(ZERO.to_string())
    }

    /// Build a version from a timestamp.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.format("%Y%m%d%H%M%S").to_string())
    }

    /// Whether `s` is a well-formed version string.
    pub fn is_valid(s: &str) -> bool {
        s == ZERO || (s.len() == VERSION_WIDTH && s.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Returns `true` for the `"0"` sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO
    }

    /// Human-readable `YYYY-MM-DD HH:MM:SS` form; the sentinel stays `0`.
    pub fn formatted(&self) -> String {
        if self.is_zero() {
            return ZERO.to_string();
        }
        let s = &self.0;
        format!(
            "{}-{}-{} {}:{}:{}",
            &s[0..4],
            &s[4..6],
            &s[6..8],
            &s[8..10],
            &s[10..12],
            &s[12..14]
        )
    }

    /// Return the underlying version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for MigrationVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // YAML happily reads 20230101000000 as an integer
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        let s = match raw {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "migration version must be a string, found {other:?}"
                )))
            }
        };
        MigrationVersion::new(s).map_err(serde::de::Error::custom)
    }
}

impl FromStr for MigrationVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for MigrationVersion {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<String> for MigrationVersion {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationVersion {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationVersion {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationVersion {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
