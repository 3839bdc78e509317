//! Reference observations and their matchups with model grid cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One sparse ground-truth observation.
///
/// Produced once per matching session by scanning the reference coordinate
/// variables; immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Index along the reference/record dimension.
    pub record_index: usize,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Time in the reference time axis unit.
    pub time: f64,
    /// Depth in the reference depth axis unit, when a depth axis exists.
    pub depth: Option<f64>,
}

/// Grid index tuple of a selected model cell.
///
/// The arity is 3 without a depth axis and 4 with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPosition {
    pub lon_index: usize,
    pub lat_index: usize,
    pub time_index: usize,
    pub depth_index: Option<usize>,
}

impl CellPosition {
    /// Number of axes actually used (3 or 4).
    pub fn arity(&self) -> usize {
        if self.depth_index.is_some() {
            4
        } else {
            3
        }
    }
}

/// Physical coordinates of a selected model cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacetimePosition {
    pub lon: f64,
    pub lat: f64,
    pub time: f64,
    pub depth: Option<f64>,
}

/// Absolute coordinate differences between a reference record and its cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupDeltas {
    pub lat: f64,
    pub lon: f64,
    pub time: f64,
    pub depth: Option<f64>,
}

/// A (reference observation, model grid cell) association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// The observation this matchup was produced for.
    pub reference: ReferenceRecord,
    /// Resolved grid index tuple.
    pub cell: CellPosition,
    /// Resolved physical coordinates of the cell.
    pub position: SpacetimePosition,
    /// Axis-wise absolute deltas between record and cell.
    pub deltas: MatchupDeltas,
    /// Extracted values keyed by variable name, populated on demand.
    pub values: HashMap<String, f64>,
}

impl Matchup {
    /// The extracted value for a variable, if already populated.
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied()
    }

    /// Record a value for a variable.
    pub fn set_value(&mut self, variable: impl Into<String>, value: f64) {
        self.values.insert(variable.into(), value);
    }
}
