//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Identifies a player (human or AI) in the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Unique identifier for units
///
/// String-backed because unit ids round-trip through decision-source JSON
/// ("U1", "worker-3") and must survive the trip verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Grid coordinates on the battle map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Clamp into map bounds (inclusive 0 .. dim-1)
    pub fn clamped(&self, bounds: &MapBounds) -> Self {
        Self {
            col: self.col.clamp(0, bounds.cols.max(1) - 1),
            row: self.row.clamp(0, bounds.rows.max(1) - 1),
        }
    }

    /// Stable "col,row" key used by the discovery sets
    pub fn key(&self) -> String {
        format!("{},{}", self.col, self.row)
    }

    /// Chebyshev (chessboard) distance in tiles
    pub fn chebyshev(&self, other: &GridPos) -> i32 {
        (self.col - other.col).abs().max((self.row - other.row).abs())
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// Battle map dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBounds {
    pub cols: i32,
    pub rows: i32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self { cols: 20, rows: 20 }
    }
}

impl MapBounds {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self { cols, rows }
    }

    pub fn contains(&self, pos: &GridPos) -> bool {
        pos.col >= 0 && pos.row >= 0 && pos.col < self.cols && pos.row < self.rows
    }
}

/// Battlefield role of a unit
///
/// Drives how often the unit's decision loop runs: reconnaissance units
/// re-think quickly, support units slowly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Worker,
    Soldier,
    Scout,
    Support,
    Siege,
}

impl UnitRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Soldier => "soldier",
            Self::Scout => "scout",
            Self::Support => "support",
            Self::Siege => "siege",
        }
    }
}
