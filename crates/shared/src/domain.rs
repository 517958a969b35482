use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity minted once per record; never reused or renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index a record occupied when it was created or last replaced.
///
/// Not renumbered when earlier rows disappear, so it can go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey(pub usize);

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the controller locates a record it was handed for delete/replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLookup {
    /// Remove whatever currently sits at the record's stored `PositionKey`.
    #[default]
    Positional,
    /// Remove the entry whose `RecordId` matches.
    Stable,
}

impl FromStr for RecordLookup {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positional" | "position" | "index" => Ok(Self::Positional),
            "stable" | "id" | "identity" => Ok(Self::Stable),
            other => Err(format!("unknown record lookup mode '{other}'")),
        }
    }
}

impl fmt::Display for RecordLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => f.write_str("positional"),
            Self::Stable => f.write_str("stable"),
        }
    }
}
