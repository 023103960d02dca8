use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved punch direction, stored as `IN` / `OUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Lenient parse: trims and ignores case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "IN" => Some(Self::In),
            "OUT" => Some(Self::Out),
            _ => None,
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }

    /// Convert DB string → enum (exact)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(Direction::In),
            "OUT" => Some(Direction::Out),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Where a punch's direction came from.
///
/// - `Unresolved`: nothing known yet.
/// - `Guessed`: the label detector's best effort (or a raw device flag).
/// - `Authoritative`: the source stated the direction explicitly.
/// - `Sequenced`: written by the normalizer from the day's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Label {
    #[default]
    Unresolved,
    Guessed(Direction),
    Authoritative(Direction),
    Sequenced(Direction),
}

impl Label {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Label::Unresolved => None,
            Label::Guessed(d) | Label::Authoritative(d) | Label::Sequenced(d) => Some(*d),
        }
    }

    pub fn source_str(&self) -> &'static str {
        match self {
            Label::Unresolved => "unresolved",
            Label::Guessed(_) => "guessed",
            Label::Authoritative(_) => "authoritative",
            Label::Sequenced(_) => "sequence",
        }
    }
}
