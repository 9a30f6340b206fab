//! Object identifiers and entity categories.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Object identifier assigned once per entity and never reused.
///
/// Backed by a strictly positive integer; its external form is the decimal
/// string (`"42"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Oid(i64);

impl Oid {
    /// Returns `None` for zero or negative values.
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid oid `{0}`; expected a positive integer")]
pub struct OidParseError(pub String);

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| OidParseError(value.to_string()))
    }
}

impl From<Oid> for String {
    fn from(value: Oid) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Oid {
    type Error = OidParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Closed set of persisted entity categories.
///
/// Each category owns one mapper and one OID sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Restaurant,
    MenuEntry,
    Critique,
    DishVote,
}

impl EntityCategory {
    pub const ALL: [Self; 4] = [
        Self::Restaurant,
        Self::MenuEntry,
        Self::Critique,
        Self::DishVote,
    ];

    /// Stable key used in storage (`oid_counters.category`) and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::MenuEntry => "menu_entry",
            Self::Critique => "critique",
            Self::DishVote => "dish_vote",
        }
    }
}

impl Display for EntityCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
