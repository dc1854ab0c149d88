//! Five-point authorization scale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission level granted to a caller or required by a request.
///
/// Levels are totally ordered: `None < Read < Write < Schema < Admin`.
/// The derived `Ord` relies on the declaration order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PermissionLevel {
    #[default]
    None,
    Read,
    Write,
    Schema,
    Admin,
}

/// Returned when a stored permission string is not one of the known levels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission level '{0}'")]
pub struct PermissionLevelParseError(pub String);

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 5] = [
        PermissionLevel::None,
        PermissionLevel::Read,
        PermissionLevel::Write,
        PermissionLevel::Schema,
        PermissionLevel::Admin,
    ];

    /// Canonical form stored in the configuration database.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Schema => "schema",
            PermissionLevel::Admin => "admin",
        }
    }

    /// Parse a stored level. Case-insensitive; unknown strings are rejected.
    pub fn parse(s: &str) -> Result<Self, PermissionLevelParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PermissionLevel::None),
            "read" => Ok(PermissionLevel::Read),
            "write" => Ok(PermissionLevel::Write),
            "schema" => Ok(PermissionLevel::Schema),
            "admin" => Ok(PermissionLevel::Admin),
            _ => Err(PermissionLevelParseError(s.to_string())),
        }
    }

    /// Header-friendly name (`Read`, `Write`, ...).
    pub fn display_name(&self) -> &'static str {
        match self {
            PermissionLevel::None => "None",
            PermissionLevel::Read => "Read",
            PermissionLevel::Write => "Write",
            PermissionLevel::Schema => "Schema",
            PermissionLevel::Admin => "Admin",
        }
    }

    #[inline]
    pub fn satisfies(&self, required: PermissionLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PermissionLevel {
    type Err = PermissionLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PermissionLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_db_string())
    }
}

impl<'de> Deserialize<'de> for PermissionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PermissionLevel::parse(&s).map_err(serde::de::Error::custom)
    }
}
